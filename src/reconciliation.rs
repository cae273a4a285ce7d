// ⚖️ Reconciliation Engine - Compare the catalog against generated rules
//
// Following the set algebra:
//   missing_in_target = catalog names − rule names
//   extra_in_target   = rule names − catalog names
//
// Rule names are raw rule keys with the season prefix stripped; keys
// without the prefix take no part in the comparison.

use crate::catalog::{display_names, NamedEntity};
use crate::deduplication::{count_duplicates, duplicate_groups, DuplicateGroup};
use crate::error::Result;
use crate::rules::extract_rule_names;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Catalog names with no matching rule (sorted)
    pub missing_in_target: BTreeSet<String>,

    /// Rule names with no matching catalog entity (sorted)
    pub extra_in_target: BTreeSet<String>,

    /// Catalog names appearing more than once, with counts
    pub source_duplicates: BTreeMap<String, usize>,

    /// Rule names that two or more raw keys normalized to, with counts
    pub target_duplicates: BTreeMap<String, usize>,

    /// Full entries behind each duplicated catalog name
    pub source_duplicate_groups: Vec<DuplicateGroup>,

    /// Number of catalog entities
    pub source_count: usize,

    /// Number of raw rule keys, prefixed or not
    pub rule_key_count: usize,

    /// Number of rule keys that carried the season prefix
    pub rule_name_count: usize,
}

impl ReconciliationReport {
    /// Every catalog name has a rule and every rule has a catalog entry
    pub fn is_consistent(&self) -> bool {
        self.missing_in_target.is_empty() && self.extra_in_target.is_empty()
    }

    /// Catalog entities minus raw rule keys
    pub fn count_difference(&self) -> i64 {
        self.source_count as i64 - self.rule_key_count as i64
    }

    /// Catalog entries folded away because they share a name with another
    pub fn merged_duplicate_count(&self) -> usize {
        self.source_duplicates.values().map(|count| count - 1).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation: {} catalog entries, {} rules ({} prefixed), {} missing, {} extra, {} duplicated names",
            self.source_count,
            self.rule_key_count,
            self.rule_name_count,
            self.missing_in_target.len(),
            self.extra_in_target.len(),
            self.source_duplicates.len()
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Literal prefix every generated rule key starts with
    pub season_prefix: String,
}

impl ReconciliationEngine {
    pub fn new(season_prefix: impl Into<String>) -> Self {
        ReconciliationEngine {
            season_prefix: season_prefix.into(),
        }
    }

    /// Reconcile catalog entities against raw rule keys
    ///
    /// Example:
    /// ```
    /// use rule_curator::{NamedEntity, ReconciliationEngine};
    ///
    /// let engine = ReconciliationEngine::new("P ");
    /// let entities = vec![NamedEntity::named("A"), NamedEntity::named("B")];
    ///
    /// let report = engine.reconcile(&entities, ["P A", "P C"]).unwrap();
    /// assert!(report.missing_in_target.contains("B"));
    /// assert!(report.extra_in_target.contains("C"));
    /// ```
    pub fn reconcile<I, S>(
        &self,
        entities: &[NamedEntity],
        rule_keys: I,
    ) -> Result<ReconciliationReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source_names = display_names(entities)?;

        let mut rule_key_count = 0;
        let rule_names = extract_rule_names(
            rule_keys.into_iter().inspect(|_| rule_key_count += 1),
            &self.season_prefix,
        );

        let source_set: BTreeSet<&str> = source_names.iter().map(String::as_str).collect();
        let rule_set: BTreeSet<&str> = rule_names.iter().map(String::as_str).collect();

        Ok(ReconciliationReport {
            missing_in_target: difference(&source_set, &rule_set),
            extra_in_target: difference(&rule_set, &source_set),
            source_duplicates: count_duplicates(&source_names),
            target_duplicates: count_duplicates(&rule_names),
            source_duplicate_groups: duplicate_groups(entities, &source_names),
            source_count: entities.len(),
            rule_key_count,
            rule_name_count: rule_names.len(),
        })
    }
}

/// Reconcile with a one-off engine
pub fn reconcile<I, S>(
    entities: &[NamedEntity],
    rule_keys: I,
    season_prefix: &str,
) -> Result<ReconciliationReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ReconciliationEngine::new(season_prefix).reconcile(entities, rule_keys)
}

fn difference(left: &BTreeSet<&str>, right: &BTreeSet<&str>) -> BTreeSet<String> {
    left.difference(right).map(|name| name.to_string()).collect()
}

// ============================================================================
// TESTS
// ============================================================================
