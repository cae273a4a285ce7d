// ✂️ Editing Session - stage rule removals, then commit to an overlay file
//
// Two files are involved:
//   original - the generated rule file, only ever read
//   overlay  - where commits go; once it exists it wins on every load
//
// Staging is purely in memory. `rules` and the overlay file change only on
// commit, and a failed commit leaves the session exactly as it was.

use crate::error::{Result, RuleError};
use crate::rules::{load_rule_set, render_rule_set, save_rule_set, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// OVERLAY RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSource {
    /// Generated rule file, nothing committed yet
    Original,

    /// Overlay file written by an earlier commit
    Overlay,
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSource::Original => "original",
            RuleSource::Overlay => "overlay",
        }
    }
}

/// Pick the authoritative rule file: overlay if it exists, else original
pub fn resolve_authoritative(original: &Path, overlay: &Path) -> Result<(PathBuf, RuleSource)> {
    if overlay.exists() {
        Ok((overlay.to_path_buf(), RuleSource::Overlay))
    } else if original.exists() {
        Ok((original.to_path_buf(), RuleSource::Original))
    } else {
        Err(RuleError::NoRuleFileFound {
            original: original.to_path_buf(),
            overlay: overlay.to_path_buf(),
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// ============================================================================
// COMMIT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub removed_count: usize,
    pub remaining_count: usize,

    /// Overlay file that now holds the rule set
    pub path: PathBuf,
}

// ============================================================================
// EDITING SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct EditingSession {
    original_path: PathBuf,
    overlay_path: PathBuf,
    authoritative_path: PathBuf,
    source: RuleSource,
    rules: RuleSet,

    /// Always a subset of `rules` keys
    staged: BTreeSet<String>,
}

impl EditingSession {
    /// Resolve the authoritative file and load it with nothing staged
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(original_path: P, overlay_path: Q) -> Result<Self> {
        let original_path = original_path.as_ref().to_path_buf();
        let overlay_path = overlay_path.as_ref().to_path_buf();

        if same_file(&original_path, &overlay_path) {
            return Err(RuleError::OverlayIsOriginal(overlay_path));
        }

        let (authoritative_path, source) = resolve_authoritative(&original_path, &overlay_path)?;
        let rules = load_rule_set(&authoritative_path)?;

        Ok(EditingSession {
            original_path,
            overlay_path,
            authoritative_path,
            source,
            rules,
            staged: BTreeSet::new(),
        })
    }

    /// Re-resolve and reload from disk, dropping staged names
    ///
    /// On failure the session keeps its current state.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::load(&self.original_path, &self.overlay_path)?;
        Ok(())
    }

    /// Flip the staged state of `name`, returning the new state
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        if !self.rules.contains_key(name) {
            return Err(RuleError::UnknownRuleName(name.to_string()));
        }

        if self.staged.remove(name) {
            Ok(false)
        } else {
            self.staged.insert(name.to_string());
            Ok(true)
        }
    }

    /// Rules minus staged names: exactly what `commit` would write
    pub fn export_active(&self) -> RuleSet {
        self.rules
            .iter()
            .filter(|(name, _)| !self.staged.contains(*name))
            .map(|(name, payload)| (name.clone(), payload.clone()))
            .collect()
    }

    /// `export_active` as pretty JSON (sorted keys, literal non-ASCII)
    pub fn export_json(&self) -> String {
        render_rule_set(&self.export_active())
    }

    /// Write the active rules to the overlay file and make it authoritative
    ///
    /// The target is always the overlay path given to [`EditingSession::load`];
    /// the original file is never written. Confirmation, if wanted, is the
    /// caller's job.
    pub fn commit(&mut self) -> Result<CommitResult> {
        if self.staged.is_empty() {
            return Err(RuleError::NothingToCommit);
        }

        let new_rules = self.export_active();
        save_rule_set(&self.overlay_path, &new_rules)?;

        let result = CommitResult {
            removed_count: self.rules.len() - new_rules.len(),
            remaining_count: new_rules.len(),
            path: self.overlay_path.clone(),
        };

        self.rules = new_rules;
        self.authoritative_path = self.overlay_path.clone();
        self.source = RuleSource::Overlay;
        self.staged.clear();

        Ok(result)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn staged(&self) -> &BTreeSet<String> {
        &self.staged
    }

    pub fn is_staged(&self, name: &str) -> bool {
        self.staged.contains(name)
    }

    /// Rule names in display order
    pub fn sorted_names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn authoritative_path(&self) -> &Path {
        &self.authoritative_path
    }

    pub fn source(&self) -> RuleSource {
        self.source
    }

    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    pub fn overlay_path(&self) -> &Path {
        &self.overlay_path
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_files(original: serde_json::Value) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let original_path = dir.path().join("rules.json");
        let overlay_path = dir.path().join("rules_mod.json");
        fs::write(&original_path, original.to_string()).unwrap();
        (dir, original_path, overlay_path)
    }

    fn abc_session() -> (TempDir, EditingSession) {
        let (dir, original, overlay) = create_test_files(json!({"A": 1, "B": 2, "C": 3}));
        let session = EditingSession::load(&original, &overlay).unwrap();
        (dir, session)
    }

    #[test]
    fn test_resolve_prefers_overlay() {
        let (_dir, original, overlay) = create_test_files(json!({"A": 1}));

        let (path, source) = resolve_authoritative(&original, &overlay).unwrap();
        assert_eq!(path, original);
        assert_eq!(source, RuleSource::Original);

        fs::write(&overlay, "{}").unwrap();
        let (path, source) = resolve_authoritative(&original, &overlay).unwrap();
        assert_eq!(path, overlay);
        assert_eq!(source, RuleSource::Overlay);
    }

    #[test]
    fn test_resolve_without_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_authoritative(&dir.path().join("a.json"), &dir.path().join("b.json"))
            .unwrap_err();
        assert!(matches!(err, RuleError::NoRuleFileFound { .. }));
    }

    #[test]
    fn test_load_reads_overlay_when_both_exist() {
        let (_dir, original, overlay) = create_test_files(json!({"A": 1, "B": 2}));
        fs::write(&overlay, json!({"A": 1}).to_string()).unwrap();

        let session = EditingSession::load(&original, &overlay).unwrap();

        assert_eq!(session.authoritative_path(), overlay.as_path());
        assert_eq!(session.source(), RuleSource::Overlay);
        assert_eq!(session.rule_count(), 1);
        assert_eq!(session.staged_count(), 0);
    }

    #[test]
    fn test_load_rejects_overlay_equal_to_original() {
        let (_dir, original, _overlay) = create_test_files(json!({"A": 1}));

        let err = EditingSession::load(&original, &original).unwrap_err();
        assert!(matches!(err, RuleError::OverlayIsOriginal(_)));
    }

    #[test]
    fn test_load_invalid_file_names_path() {
        let (_dir, original, overlay) = create_test_files(json!(["not", "an", "object"]));

        match EditingSession::load(&original, &overlay) {
            Err(RuleError::InvalidRuleFile { path, .. }) => assert_eq!(path, original),
            other => panic!("expected InvalidRuleFile, got {:?}", other),
        }
    }

    #[test]
    fn test_toggle_is_reversible() {
        let (_dir, mut session) = abc_session();
        let before = session.rules().clone();

        assert!(session.toggle("B").unwrap());
        assert!(session.is_staged("B"));
        assert!(!session.toggle("B").unwrap());
        assert!(!session.is_staged("B"));

        assert!(session.staged().is_empty());
        assert_eq!(session.rules(), &before);
    }

    #[test]
    fn test_toggle_unknown_name_fails() {
        let (_dir, mut session) = abc_session();

        let err = session.toggle("Z").unwrap_err();
        assert!(matches!(err, RuleError::UnknownRuleName(ref name) if name == "Z"));
        assert!(session.staged().is_empty());
    }

    #[test]
    fn test_export_active_excludes_staged() {
        let (_dir, mut session) = abc_session();
        session.toggle("A").unwrap();

        let active = session.export_active();
        assert_eq!(active.len(), 2);
        assert!(!active.contains_key("A"));
        // Export never mutates the session
        assert_eq!(session.rule_count(), 3);
        assert!(session.is_staged("A"));
    }

    #[test]
    fn test_commit_example() {
        let (_dir, mut session) = abc_session();
        session.toggle("B").unwrap();

        let preview = session.export_active();
        let result = session.commit().unwrap();

        assert_eq!(result.removed_count, 1);
        assert_eq!(result.remaining_count, 2);
        assert_eq!(result.path, session.overlay_path());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(session.overlay_path()).unwrap()).unwrap();
        assert_eq!(written, json!({"A": 1, "C": 3}));

        assert!(session.staged().is_empty());
        assert_eq!(session.export_active(), preview);
        assert_eq!(session.source(), RuleSource::Overlay);
        assert_eq!(session.authoritative_path(), session.overlay_path());
    }

    #[test]
    fn test_commit_keeps_payload_numbers_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("rules.json");
        let overlay = dir.path().join("rules_mod.json");
        fs::write(
            &original,
            r#"{"A": {"big": 123456789012345678901234567890, "ratio": 1.10}, "B": 2}"#,
        )
        .unwrap();

        let mut session = EditingSession::load(&original, &overlay).unwrap();
        assert!(session.export_json().contains("123456789012345678901234567890"));

        session.toggle("B").unwrap();
        session.commit().unwrap();

        let written = fs::read_to_string(&overlay).unwrap();
        assert!(written.contains(r#""big": 123456789012345678901234567890"#));
        assert!(written.contains(r#""ratio": 1.10"#));
        assert!(!written.contains("\"B\""));
    }

    #[test]
    fn test_commit_never_touches_original() {
        let (_dir, mut session) = abc_session();
        let original_bytes = fs::read(session.original_path()).unwrap();

        session.toggle("A").unwrap();
        session.commit().unwrap();
        session.toggle("C").unwrap();
        session.commit().unwrap();

        assert_eq!(fs::read(session.original_path()).unwrap(), original_bytes);
        assert_eq!(session.sorted_names(), vec!["B"]);
    }

    #[test]
    fn test_commit_with_nothing_staged() {
        let (_dir, mut session) = abc_session();

        let err = session.commit().unwrap_err();
        assert!(err.is_informational());
        assert!(!session.overlay_path().exists());
        assert_eq!(session.source(), RuleSource::Original);
    }

    #[test]
    fn test_failed_commit_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("rules.json");
        let overlay = dir.path().join("missing-dir").join("rules_mod.json");
        fs::write(&original, json!({"A": 1, "B": 2}).to_string()).unwrap();

        let mut session = EditingSession::load(&original, &overlay).unwrap();
        session.toggle("A").unwrap();

        let err = session.commit().unwrap_err();
        assert!(matches!(err, RuleError::Persistence { .. }));
        assert_eq!(session.rule_count(), 2);
        assert!(session.is_staged("A"));
        assert_eq!(session.authoritative_path(), original.as_path());

        // Still usable
        assert!(!session.toggle("A").unwrap());
    }

    #[test]
    fn test_reload_picks_up_overlay_and_clears_staging() {
        let (_dir, mut session) = abc_session();
        session.toggle("A").unwrap();
        session.commit().unwrap();

        session.toggle("B").unwrap();
        session.reload().unwrap();

        assert_eq!(session.source(), RuleSource::Overlay);
        assert!(session.staged().is_empty());
        assert_eq!(session.sorted_names(), vec!["B", "C"]);
    }

    #[test]
    fn test_failed_reload_keeps_session() {
        let (_dir, mut session) = abc_session();
        session.toggle("A").unwrap();
        fs::write(session.original_path(), "not json").unwrap();

        assert!(session.reload().is_err());
        assert_eq!(session.rule_count(), 3);
        assert!(session.is_staged("A"));
    }

    #[test]
    fn test_export_json_is_pretty_and_sorted() {
        let (_dir, original, overlay) =
            create_test_files(json!({"新番 B": {"enabled": true}, "新番 A": {"enabled": false}}));
        let session = EditingSession::load(&original, &overlay).unwrap();

        let text = session.export_json();
        assert!(text.find("新番 A").unwrap() < text.find("新番 B").unwrap());
        assert!(text.contains('\n'));
    }
}
