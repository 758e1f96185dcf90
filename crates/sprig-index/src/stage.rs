//! The [`Stage`]: pending additions and removals.
//!
//! The stage is purely in-memory; the repository layer loads it from and
//! saves it to the stage record around every command. Content is written to
//! the object store at add time, so a later commit only records blob ids.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use sprig_crypto::ContentHasher;
use sprig_store::ObjectStore;
use sprig_types::Blob;

use crate::error::{IndexError, IndexResult};

/// What [`Stage::stage_add`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageChange {
    /// The content differs from the committed version and is now staged.
    Staged(Blob),
    /// The content matches the committed version; any earlier stage entry
    /// for the file was dropped.
    Unchanged,
}

/// What [`Stage::stage_remove`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// A pending addition was withdrawn; the file stays in the working tree.
    Unstaged,
    /// A tracked file is now marked for removal. The caller deletes the
    /// working copy.
    MarkedRemoved,
}

/// The staging area.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    added: BTreeMap<String, Blob>,
    removed: BTreeSet<String>,
}

impl Stage {
    /// Create an empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is staged in either direction.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Pending additions, sorted by name.
    pub fn added(&self) -> &BTreeMap<String, Blob> {
        &self.added
    }

    /// Pending removals, sorted.
    pub fn removed(&self) -> &BTreeSet<String> {
        &self.removed
    }

    pub fn staged_blob(&self, name: &str) -> Option<&Blob> {
        self.added.get(name)
    }

    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.contains(name)
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage `content` as the next version of `name`.
    ///
    /// `committed` is the blob the current commit tracks for `name`. If the
    /// new content hashes to the same id, the file is dropped from the stage
    /// instead. Either way a pending removal of `name` is cancelled.
    pub fn stage_add(
        &mut self,
        name: &str,
        content: &[u8],
        committed: Option<&Blob>,
        store: &dyn ObjectStore,
    ) -> IndexResult<StageChange> {
        validate_path(name)?;
        self.removed.remove(name);

        let id = ContentHasher::BLOB.hash(content);
        if committed.is_some_and(|blob| blob.id == id) {
            if self.added.remove(name).is_some() {
                debug!(file = name, "content matches commit, unstaged");
            }
            return Ok(StageChange::Unchanged);
        }

        store.put_blob(content)?;
        let revision = committed.map_or(1, Blob::next_revision);
        let blob = Blob::new(id, name, revision);
        debug!(file = name, id = %id.short_hex(), revision, "staged file");
        self.added.insert(name.to_string(), blob.clone());
        Ok(StageChange::Staged(blob))
    }

    /// Stage the removal of `name`.
    ///
    /// A pending addition is withdrawn first; otherwise a file the current
    /// commit tracks is marked removed. Anything else is an error.
    pub fn stage_remove(&mut self, name: &str, tracked: bool) -> IndexResult<RemoveOutcome> {
        if self.added.remove(name).is_some() {
            debug!(file = name, "withdrew staged addition");
            return Ok(RemoveOutcome::Unstaged);
        }
        if tracked {
            debug!(file = name, "staged removal");
            self.removed.insert(name.to_string());
            return Ok(RemoveOutcome::MarkedRemoved);
        }
        Err(IndexError::NothingToRemove(name.to_string()))
    }

    /// Fold the stage into `snapshot`: overlay additions, drop removals.
    pub fn apply_to(&self, snapshot: &mut BTreeMap<String, Blob>) {
        for (name, blob) in &self.added {
            snapshot.insert(name.clone(), blob.clone());
        }
        for name in &self.removed {
            snapshot.remove(name);
        }
    }

    /// Empty both collections.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}

/// Check that `name` is a relative working-tree path without traversal.
pub fn validate_path(name: &str) -> IndexResult<()> {
    let invalid = |reason: &str| IndexError::InvalidPath(format!("{name:?}: {reason}"));
    if name.is_empty() {
        return Err(invalid("empty path"));
    }
    if name.starts_with('/') || name.contains('\\') {
        return Err(invalid("must be a relative path using '/'"));
    }
    for component in name.split('/') {
        match component {
            "" => return Err(invalid("empty component")),
            "." | ".." => return Err(invalid("must not contain '.' or '..' components")),
            ".sprig" => return Err(invalid("inside the repository directory")),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sprig_store::InMemoryObjectStore;

    fn committed(name: &str, content: &[u8], revision: u32) -> Blob {
        Blob::new(ContentHasher::BLOB.hash(content), name, revision)
    }

    #[test]
    fn add_new_file_starts_at_revision_one() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        let change = stage.stage_add("f.txt", b"hello", None, &store).unwrap();

        let StageChange::Staged(blob) = change else {
            panic!("expected staged");
        };
        assert_eq!(blob.revision, 1);
        assert_eq!(store.get_blob(&blob.id).unwrap(), b"hello");
        assert_eq!(stage.staged_blob("f.txt"), Some(&blob));
    }

    #[test]
    fn add_changed_file_bumps_revision() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        let old = committed("f.txt", b"v1", 3);
        let change = stage.stage_add("f.txt", b"v2", Some(&old), &store).unwrap();
        assert!(matches!(change, StageChange::Staged(ref b) if b.revision == 4));
    }

    #[test]
    fn re_adding_committed_content_unstages() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        let old = committed("f.txt", b"v1", 1);

        stage.stage_add("f.txt", b"dirty", Some(&old), &store).unwrap();
        assert!(!stage.is_empty());

        let change = stage.stage_add("f.txt", b"v1", Some(&old), &store).unwrap();
        assert_eq!(change, StageChange::Unchanged);
        assert!(stage.is_empty());
    }

    #[test]
    fn add_cancels_pending_removal() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        let old = committed("f.txt", b"v1", 1);

        stage.stage_remove("f.txt", true).unwrap();
        assert!(stage.is_removed("f.txt"));

        stage.stage_add("f.txt", b"v1", Some(&old), &store).unwrap();
        assert!(!stage.is_removed("f.txt"));
        assert!(stage.is_empty());
    }

    #[test]
    fn remove_withdraws_staged_addition() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        stage.stage_add("new.txt", b"x", None, &store).unwrap();

        assert_eq!(
            stage.stage_remove("new.txt", false).unwrap(),
            RemoveOutcome::Unstaged
        );
        assert!(stage.staged_blob("new.txt").is_none());
        assert!(!stage.is_removed("new.txt"));
    }

    #[test]
    fn remove_untracked_unstaged_file_fails() {
        let mut stage = Stage::new();
        let err = stage.stage_remove("ghost.txt", false).unwrap_err();
        assert!(matches!(err, IndexError::NothingToRemove(_)));
        assert_eq!(err.to_string(), "No reason to remove the file.");
    }

    #[test]
    fn apply_to_overlays_and_drops() {
        let store = InMemoryObjectStore::new();
        let mut snapshot = BTreeMap::new();
        snapshot.insert("keep".to_string(), committed("keep", b"k", 1));
        snapshot.insert("gone".to_string(), committed("gone", b"g", 1));
        snapshot.insert("edit".to_string(), committed("edit", b"e1", 1));

        let mut stage = Stage::new();
        stage.stage_remove("gone", true).unwrap();
        stage
            .stage_add("edit", b"e2", snapshot.get("edit"), &store)
            .unwrap();
        stage.stage_add("new", b"n", None, &store).unwrap();
        stage.apply_to(&mut snapshot);

        let names: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["edit", "keep", "new"]);
        assert_eq!(snapshot["edit"].revision, 2);
    }

    #[test]
    fn clear_empties_everything() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        stage.stage_add("a", b"a", None, &store).unwrap();
        stage.stage_remove("b", true).unwrap();
        stage.clear();
        assert!(stage.is_empty());
    }

    #[test]
    fn stage_survives_bincode() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        stage.stage_add("a", b"a", None, &store).unwrap();
        stage.stage_remove("b", true).unwrap();
        let bytes = bincode::serialize(&stage).unwrap();
        let decoded: Stage = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, stage);
    }

    #[test]
    fn path_validation() {
        assert!(validate_path("f.txt").is_ok());
        assert!(validate_path("dir/f.txt").is_ok());
        for bad in ["", "/abs", "a//b", "../up", "a/./b", ".sprig/state", "a\\b"] {
            assert!(validate_path(bad).is_err(), "{bad:?} accepted");
        }
    }

    proptest! {
        #[test]
        fn add_then_remove_leaves_name_in_neither_set(
            content in proptest::collection::vec(any::<u8>(), 0..256),
            tracked in any::<bool>(),
        ) {
            let store = InMemoryObjectStore::new();
            let mut stage = Stage::new();
            let previous = committed("f", b"committed", 1);
            let committed_blob = tracked.then_some(&previous);

            prop_assume!(content != b"committed");

            stage.stage_add("f", &content, committed_blob, &store).unwrap();
            let outcome = stage.stage_remove("f", tracked);
            prop_assert!(matches!(outcome, Ok(RemoveOutcome::Unstaged)), "{:?}", outcome);

            prop_assert!(stage.staged_blob("f").is_none());
            prop_assert!(!stage.is_removed("f"));
        }
    }
}
