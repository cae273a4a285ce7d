// 🏷️ Rule Sets - Rules as Data
// Download rules keyed by name; payloads are passed through untouched.
//
// Rule keys are generated as "<season> <work name>", so the comparable
// rule name is whatever follows the season prefix.

use crate::error::{Result, RuleError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Rule name → opaque rule payload, ordered by key for stable output
pub type RuleSet = BTreeMap<String, Value>;

// ============================================================================
// RULE NAMES
// ============================================================================

/// Strip the season prefix from a raw rule key
///
/// Keys without the prefix have no comparable name and yield `None`.
pub fn rule_name<'a>(key: &'a str, season_prefix: &str) -> Option<&'a str> {
    key.strip_prefix(season_prefix)
}

/// Derive rule names from raw keys, silently dropping unprefixed keys
///
/// Input order is kept; two raw keys that normalize to the same name both
/// appear, which is what duplicate detection looks for.
pub fn extract_rule_names<I, S>(keys: I, season_prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .filter_map(|key| rule_name(key.as_ref(), season_prefix).map(str::to_string))
        .collect()
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Load a rule file whose top level must be a JSON object
pub fn load_rule_set<P: AsRef<Path>>(path: P) -> Result<RuleSet> {
    let path = path.as_ref();
    let invalid = |reason: String| RuleError::InvalidRuleFile {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(invalid(format!(
            "top level is {}, expected an object",
            json_type_name(&other)
        ))),
    }
}

/// Pretty JSON with sorted keys and literal (unescaped) non-ASCII text
pub fn render_rule_set(rules: &RuleSet) -> String {
    let object: serde_json::Map<String, Value> = rules
        .iter()
        .map(|(name, payload)| (name.clone(), payload.clone()))
        .collect();
    format!("{:#}", Value::Object(object))
}

/// Replace the file at `path` with `rules`
///
/// Writes to a `.tmp` sibling first, then renames over the target so a
/// crash never leaves a half-written rule file behind.
pub fn save_rule_set(path: &Path, rules: &RuleSet) -> Result<()> {
    let persistence = |source: std::io::Error| RuleError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = temp_path_for(path);
    let mut content = render_rule_set(rules);
    content.push('\n');

    if let Err(e) = fs::write(&tmp_path, content) {
        let _ = fs::remove_file(&tmp_path);
        return Err(persistence(e));
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(persistence(e));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rules.json".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_rules() -> RuleSet {
        let mut rules = RuleSet::new();
        rules.insert("2025年10月新番 B".to_string(), json!({"enabled": true}));
        rules.insert("2025年10月新番 A".to_string(), json!({"savePath": "D:\\Anime\\A"}));
        rules
    }

    #[test]
    fn test_rule_name_strips_prefix() {
        assert_eq!(rule_name("P Frieren", "P "), Some("Frieren"));
        assert_eq!(rule_name("Q Frieren", "P "), None);
        // Prefix must lead the key, not merely appear in it
        assert_eq!(rule_name("x P Frieren", "P "), None);
    }

    #[test]
    fn test_extract_rule_names_drops_unprefixed_keys() {
        let keys = ["P A", "other rule", "P B", "PA"];
        assert_eq!(extract_rule_names(keys, "P "), vec!["A", "B"]);
    }

    #[test]
    fn test_extract_rule_names_keeps_collisions() {
        let keys = ["P A", "P A"];
        assert_eq!(extract_rule_names(keys, "P ").len(), 2);
    }

    #[test]
    fn test_load_rule_set_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        match load_rule_set(&path) {
            Err(RuleError::InvalidRuleFile { path: p, reason }) => {
                assert_eq!(p, path);
                assert!(reason.contains("an array"));
            }
            other => panic!("expected InvalidRuleFile, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rule_set_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, "{\"A\": ").unwrap();

        assert!(matches!(
            load_rule_set(&path),
            Err(RuleError::InvalidRuleFile { .. })
        ));
    }

    #[test]
    fn test_render_is_sorted_and_keeps_non_ascii() {
        let text = render_rule_set(&create_test_rules());

        assert!(text.contains("2025年10月新番 A"));
        assert!(!text.contains("\\u"));
        let a = text.find("新番 A").unwrap();
        let b = text.find("新番 B").unwrap();
        assert!(a < b);
        assert!(text.contains("\n  \""));
    }

    #[test]
    fn test_save_then_load_preserves_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules_mod.json");
        let rules = create_test_rules();

        save_rule_set(&path, &rules).unwrap();

        assert_eq!(load_rule_set(&path).unwrap(), rules);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rules.json");

        let err = save_rule_set(&path, &create_test_rules()).unwrap_err();
        assert!(matches!(err, RuleError::Persistence { .. }));
    }
}
