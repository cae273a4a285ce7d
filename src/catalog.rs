// 📚 Catalog - source entities the generated rules are checked against
//
// Each entity resolves to one display name:
//   chinese_name (if present and non-empty) → cleaned_title → error
// The remaining fields only feed duplicate-group reporting.

use crate::error::{Result, RuleError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// NAMED ENTITY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Canonical / localized name (preferred display name)
    #[serde(default)]
    pub chinese_name: Option<String>,

    /// Cleaned title (fallback display name)
    #[serde(default)]
    pub cleaned_title: Option<String>,

    /// Title as it appeared in the source listing
    #[serde(default)]
    pub original_title: Option<String>,

    /// Catalog identifier
    #[serde(default)]
    pub bangumi_id: Option<u64>,

    #[serde(default)]
    pub air_date: Option<NaiveDate>,
}

impl NamedEntity {
    /// Entity known only by its localized name
    pub fn named(name: &str) -> Self {
        NamedEntity {
            chinese_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Entity known only by its cleaned title
    pub fn titled(title: &str) -> Self {
        NamedEntity {
            cleaned_title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Resolve the comparable display name, `None` if the entity is unnamable
    pub fn display_name(&self) -> Option<&str> {
        match self.chinese_name.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ => self.cleaned_title.as_deref(),
        }
    }
}

/// Resolve every display name, failing on the first unnamable entity
pub fn display_names(entities: &[NamedEntity]) -> Result<Vec<String>> {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            entity
                .display_name()
                .map(str::to_string)
                .ok_or(RuleError::MissingRequiredField { index })
        })
        .collect()
}

/// Load a catalog file (JSON array of entity objects)
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<NamedEntity>> {
    let path = path.as_ref();
    let invalid = |reason: String| RuleError::InvalidCatalog {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
