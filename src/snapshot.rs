//! C6: per-codebase file-change detector (§4.6).
//!
//! Owns the persisted `relative_path -> content_hash` map and the diff
//! against a freshly observed file state. Walking the tree and applying
//! the ignore/extension filters is the `Indexer`'s job (§4.7); this module
//! only diffs and persists.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::short_hash;

/// Result of diffing the current file state against the stored snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotFile {
    files: HashMap<String, String>,
    last_updated: i64,
}

/// Per-codebase snapshot of indexed file hashes, atomically persisted.
pub struct SnapshotSynchronizer {
    snapshot_path: PathBuf,
    state: HashMap<String, String>,
    last_updated: i64,
}

/// Derive the stable per-codebase identifier used for the snapshot
/// filename and (per §4.7) the store collection name, from its absolute
/// path. See DESIGN.md for why this substitutes SHA-256 for the source's
/// literal MD5 reference.
pub fn codebase_identifier(codebase_path: &Path) -> String {
    short_hash(&codebase_path.to_string_lossy(), 8)
}

impl SnapshotSynchronizer {
    pub fn new(codebase_path: &Path, data_dir: &Path) -> Self {
        let id = codebase_identifier(codebase_path);
        let snapshot_path = data_dir.join("snapshots").join(format!("{id}.json"));
        Self {
            snapshot_path,
            state: HashMap::new(),
            last_updated: 0,
        }
    }

    #[cfg(test)]
    fn at_path(snapshot_path: PathBuf) -> Self {
        Self {
            snapshot_path,
            state: HashMap::new(),
            last_updated: 0,
        }
    }

    /// Load the persisted snapshot, or start empty if none exists yet.
    pub fn initialize(&mut self) -> Result<()> {
        if !self.snapshot_path.exists() {
            self.state = HashMap::new();
            self.last_updated = 0;
            return Ok(());
        }
        let text = fs::read_to_string(&self.snapshot_path)?;
        let parsed: SnapshotFile = serde_json::from_str(&text)?;
        self.state = parsed.files;
        self.last_updated = parsed.last_updated;
        Ok(())
    }

    /// Diff `current` (relative path -> content hash, already filtered by
    /// the caller's ignore/extension rules) against the stored state.
    pub fn check_for_changes(&self, current: &HashMap<String, String>) -> ChangeSet {
        let mut added = Vec::new();
        let mut modified = Vec::new();
        for (path, hash) in current {
            match self.state.get(path) {
                None => added.push(path.clone()),
                Some(prev) if prev != hash => modified.push(path.clone()),
                _ => {}
            }
        }
        let mut removed: Vec<String> = self
            .state
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned()
            .collect();

        added.sort();
        modified.sort();
        removed.sort();
        ChangeSet { added, removed, modified }
    }

    /// Replace the in-memory state with `current`; takes effect once
    /// `commit` is called.
    pub fn update_state(&mut self, current: HashMap<String, String>) {
        self.state = current;
    }

    /// Atomically persist the current state (temp file + rename).
    pub fn commit(&mut self) -> Result<()> {
        self.last_updated = chrono::Utc::now().timestamp();
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = SnapshotFile {
            files: self.state.clone(),
            last_updated: self.last_updated,
        };
        let json = serde_json::to_string_pretty(&data)?;
        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.snapshot_path)?;
        Ok(())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn state(&self) -> &HashMap<String, String> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn codebase_identifier_is_stable_and_truncated() {
        let p = Path::new("/home/user/project");
        assert_eq!(codebase_identifier(p), codebase_identifier(p));
        assert_eq!(codebase_identifier(p).len(), 8);
    }

    #[test]
    fn initialize_on_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let mut sync = SnapshotSynchronizer::at_path(dir.path().join("missing.json"));
        sync.initialize().unwrap();
        assert!(sync.state().is_empty());
    }

    #[test]
    fn detects_added_removed_and_modified() {
        let dir = tempdir().unwrap();
        let mut sync = SnapshotSynchronizer::at_path(dir.path().join("snap.json"));
        sync.initialize().unwrap();

        let mut initial = HashMap::new();
        initial.insert("a.rs".to_string(), "hash_a".to_string());
        initial.insert("b.rs".to_string(), "hash_b".to_string());
        sync.update_state(initial);
        sync.commit().unwrap();

        let mut current = HashMap::new();
        current.insert("a.rs".to_string(), "hash_a".to_string()); // unchanged
        current.insert("b.rs".to_string(), "hash_b2".to_string()); // modified
        current.insert("c.rs".to_string(), "hash_c".to_string()); // added

        let changes = sync.check_for_changes(&current);
        assert_eq!(changes.added, vec!["c.rs".to_string()]);
        assert_eq!(changes.modified, vec!["b.rs".to_string()]);
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn unchanged_tree_yields_empty_changeset() {
        let dir = tempdir().unwrap();
        let mut sync = SnapshotSynchronizer::at_path(dir.path().join("snap.json"));
        sync.initialize().unwrap();

        let mut state = HashMap::new();
        state.insert("a.rs".to_string(), "hash_a".to_string());
        sync.update_state(state.clone());
        sync.commit().unwrap();

        let changes = sync.check_for_changes(&state);
        assert!(changes.is_empty());
    }

    #[test]
    fn commit_then_reload_round_trips_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.json");

        let mut sync = SnapshotSynchronizer::at_path(path.clone());
        sync.initialize().unwrap();
        let mut state = HashMap::new();
        state.insert("a.rs".to_string(), "hash_a".to_string());
        sync.update_state(state.clone());
        sync.commit().unwrap();

        let mut reloaded = SnapshotSynchronizer::at_path(path);
        reloaded.initialize().unwrap();
        assert_eq!(reloaded.state(), &state);
    }

    #[test]
    fn commit_writes_atomically_leaving_no_tmp_file_behind() {
        let dir = tempdir().unwrap();
        let mut sync = SnapshotSynchronizer::at_path(dir.path().join("snap.json"));
        sync.initialize().unwrap();
        sync.update_state(HashMap::new());
        sync.commit().unwrap();
        assert!(!dir.path().join("snap.json.tmp").exists());
        assert!(dir.path().join("snap.json").exists());
    }

    #[test]
    fn added_and_modified_are_disjoint() {
        let dir = tempdir().unwrap();
        let mut sync = SnapshotSynchronizer::at_path(dir.path().join("snap.json"));
        sync.initialize().unwrap();
        let mut initial = HashMap::new();
        initial.insert("a.rs".to_string(), "h1".to_string());
        sync.update_state(initial);
        sync.commit().unwrap();

        let mut current = HashMap::new();
        current.insert("a.rs".to_string(), "h2".to_string());
        current.insert("b.rs".to_string(), "h3".to_string());
        let changes = sync.check_for_changes(&current);
        let added_set: std::collections::HashSet<_> = changes.added.iter().collect();
        let modified_set: std::collections::HashSet<_> = changes.modified.iter().collect();
        assert!(added_set.is_disjoint(&modified_set));
    }
}
