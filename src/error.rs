// ⚠️ Error taxonomy - every failure is terminal to one operation only
//
// A failed call never leaves an EditingSession half-updated; the caller
// decides how to present the error (and whether to retry).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Catalog entity has neither a localized name nor a cleaned title
    #[error("catalog entry #{index} has no chinese_name or cleaned_title")]
    MissingRequiredField { index: usize },

    /// Catalog file unreadable or not a JSON array of objects
    #[error("invalid catalog file {path:?}: {reason}")]
    InvalidCatalog { path: PathBuf, reason: String },

    /// Neither the overlay nor the original rule file exists
    #[error("no rule file found (looked for {overlay:?} and {original:?})")]
    NoRuleFileFound { original: PathBuf, overlay: PathBuf },

    /// Rule file is malformed JSON or its top level is not an object
    #[error("invalid rule file {path:?}: {reason}")]
    InvalidRuleFile { path: PathBuf, reason: String },

    /// Overlay and original point at the same file
    #[error("overlay path {0:?} is the original rule file")]
    OverlayIsOriginal(PathBuf),

    #[error("unknown rule name: {0}")]
    UnknownRuleName(String),

    /// Commit requested with an empty staging set
    #[error("no rules staged for deletion")]
    NothingToCommit,

    /// Writing the overlay file failed; in-memory state is unchanged
    #[error("failed to write rule file {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RuleError {
    /// Informational errors are safe to show as a notice instead of a failure
    pub fn is_informational(&self) -> bool {
        matches!(self, RuleError::NothingToCommit)
    }
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
