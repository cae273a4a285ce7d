// Rule Curator - Core Library
// Reconciles generated download rules against the source catalog and edits
// rule sets through a staged-deletion session. Used by the CLI, TUI and tests.

pub mod error;
pub mod catalog;
pub mod rules;
pub mod deduplication;
pub mod reconciliation;
pub mod session;
pub mod config;

// Re-export commonly used types
pub use error::{Result, RuleError};
pub use catalog::{display_names, load_catalog, NamedEntity};
pub use rules::{
    extract_rule_names, load_rule_set, render_rule_set, rule_name, save_rule_set, RuleSet,
};
pub use deduplication::{count_duplicates, duplicate_groups, DuplicateGroup};
pub use reconciliation::{reconcile, ReconciliationEngine, ReconciliationReport};
pub use session::{resolve_authoritative, CommitResult, EditingSession, RuleSource};
pub use config::{overlay_path_for, season_prefix, Settings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
