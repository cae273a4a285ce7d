// ⚙️ Settings - where the catalog and rule files live, and which season
//
// Loaded from an optional JSON file; every field has a default so an empty
// object (or no file at all) is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "rule-curator.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Season label that generated rule keys start with
    #[serde(default = "default_season")]
    pub season: String,

    /// Catalog of source entities (JSON array)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Generated rule file; never written by this tool
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,

    /// Overlay file commits go to (derived from `rules_path` when unset)
    #[serde(default)]
    pub overlay_path: Option<PathBuf>,
}

fn default_season() -> String {
    "2025年10月新番".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("bangumi_results.json")
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("qb_download_rules.json")
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            season: default_season(),
            catalog_path: default_catalog_path(),
            rules_path: default_rules_path(),
            overlay_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path.as_ref()))
    }

    /// Load an explicit config file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn season_prefix(&self) -> String {
        season_prefix(&self.season)
    }

    pub fn resolved_overlay_path(&self) -> PathBuf {
        self.overlay_path
            .clone()
            .unwrap_or_else(|| overlay_path_for(&self.rules_path))
    }
}

/// Rule keys are generated as "<season> <work name>"
pub fn season_prefix(season: &str) -> String {
    format!("{} ", season)
}

/// `<stem>_mod.<ext>` next to the original rule file
pub fn overlay_path_for(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rules".to_string());

    let file_name = match original.extension() {
        Some(ext) => format!("{}_mod.{}", stem, ext.to_string_lossy()),
        None => format!("{}_mod", stem),
    };

    original.with_file_name(file_name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_path_for() {
        assert_eq!(
            overlay_path_for(Path::new("qb_download_rules.json")),
            PathBuf::from("qb_download_rules_mod.json")
        );
        assert_eq!(
            overlay_path_for(Path::new("/data/rules")),
            PathBuf::from("/data/rules_mod")
        );
    }

    #[test]
    fn test_season_prefix() {
        assert_eq!(season_prefix("2025年10月新番"), "2025年10月新番 ");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.resolved_overlay_path(),
            PathBuf::from("qb_download_rules_mod.json")
        );
    }

    #[test]
    fn test_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"season": "2026年1月新番", "rules_path": "out/rules.json", "overlay_path": "out/edited.json"}"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.season_prefix(), "2026年1月新番 ");
        assert_eq!(settings.catalog_path, PathBuf::from("bangumi_results.json"));
        assert_eq!(settings.resolved_overlay_path(), PathBuf::from("out/edited.json"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(dir.path().join("nope.json").as_path())).is_err());
    }
}
