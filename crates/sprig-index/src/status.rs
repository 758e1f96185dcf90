//! Working directory status.
//!
//! [`WorkdirStatus::compute`] compares three views of the tree: the files
//! the current commit tracks, the stage, and the content ids of the files
//! actually present in the working directory.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sprig_types::{Blob, ObjectId};

use crate::stage::Stage;

/// Complete status of the working directory relative to commit and stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Files staged for addition.
    pub staged: Vec<String>,
    /// Files staged for removal.
    pub removed: Vec<String>,
    /// Tracked or staged files whose working copy differs or is missing.
    pub unstaged: Vec<StatusEntry>,
    /// Files present in the working directory but neither tracked nor staged.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute status from the tracked snapshot, the stage and the working
    /// files (name to content id). Every section comes out sorted.
    pub fn compute(
        tracked: &BTreeMap<String, Blob>,
        stage: &Stage,
        working: &BTreeMap<String, ObjectId>,
    ) -> Self {
        let staged = stage.added().keys().cloned().collect();
        let removed = stage.removed().iter().cloned().collect();

        let mut unstaged = Vec::new();
        for (name, blob) in tracked {
            if stage.staged_blob(name).is_some() || stage.is_removed(name) {
                continue;
            }
            match working.get(name) {
                None => unstaged.push(StatusEntry::new(name, FileStatus::Deleted)),
                Some(id) if *id != blob.id => {
                    unstaged.push(StatusEntry::new(name, FileStatus::Modified))
                }
                Some(_) => {}
            }
        }
        for (name, blob) in stage.added() {
            match working.get(name) {
                None => unstaged.push(StatusEntry::new(name, FileStatus::Deleted)),
                Some(id) if *id != blob.id => {
                    unstaged.push(StatusEntry::new(name, FileStatus::Modified))
                }
                Some(_) => {}
            }
        }
        unstaged.sort();

        let untracked = working
            .keys()
            .filter(|name| {
                !tracked.contains_key(*name)
                    && stage.staged_blob(name).is_none()
                    && !stage.is_removed(name)
            })
            .cloned()
            .collect();

        Self {
            staged,
            removed,
            unstaged,
            untracked,
        }
    }

    /// Keep only the untracked names for which `keep` returns `true`.
    pub fn retain_untracked<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.untracked.retain(|name| keep(name));
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
    }

    /// Returns `true` if there are any staged changes.
    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty() || !self.removed.is_empty()
    }
}

/// A single unstaged change.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The file path relative to the workdir root.
    pub path: String,
    /// The kind of change.
    pub status: FileStatus,
}

impl StatusEntry {
    /// Create a new status entry.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.status)
    }
}

/// The kind of unstaged change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileStatus {
    /// The working copy's content differs.
    Modified,
    /// The working copy is gone.
    Deleted,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => f.write_str("modified"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_crypto::ContentHasher;
    use sprig_store::InMemoryObjectStore;

    fn id(content: &[u8]) -> ObjectId {
        ContentHasher::BLOB.hash(content)
    }

    fn tracked(files: &[(&str, &[u8])]) -> BTreeMap<String, Blob> {
        files
            .iter()
            .map(|(name, content)| (name.to_string(), Blob::new(id(content), *name, 1)))
            .collect()
    }

    fn working(files: &[(&str, &[u8])]) -> BTreeMap<String, ObjectId> {
        files
            .iter()
            .map(|(name, content)| (name.to_string(), id(content)))
            .collect()
    }

    #[test]
    fn clean_tree() {
        let files: &[(&str, &[u8])] = &[("a", b"1"), ("b", b"2")];
        let status = WorkdirStatus::compute(&tracked(files), &Stage::new(), &working(files));
        assert!(status.is_clean());
        assert!(!status.has_staged_changes());
    }

    #[test]
    fn modified_and_deleted_tracked_files() {
        let commit = tracked(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        let tree = working(&[("a", b"changed"), ("c", b"3")]);
        let status = WorkdirStatus::compute(&commit, &Stage::new(), &tree);

        let shown: Vec<String> = status.unstaged.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["a (modified)", "b (deleted)"]);
        assert!(status.untracked.is_empty());
    }

    #[test]
    fn staged_files_compare_against_stage() {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        stage.stage_add("new", b"v1", None, &store).unwrap();
        stage.stage_add("gone", b"g", None, &store).unwrap();

        let tree = working(&[("new", b"v2")]);
        let status = WorkdirStatus::compute(&BTreeMap::new(), &stage, &tree);

        assert_eq!(status.staged, vec!["gone", "new"]);
        assert_eq!(
            status.unstaged,
            vec![
                StatusEntry::new("gone", FileStatus::Deleted),
                StatusEntry::new("new", FileStatus::Modified),
            ]
        );
        assert!(status.untracked.is_empty());
    }

    #[test]
    fn removed_files_are_neither_deleted_nor_untracked() {
        let mut stage = Stage::new();
        stage.stage_remove("a", true).unwrap();
        let commit = tracked(&[("a", b"1")]);

        let status = WorkdirStatus::compute(&commit, &stage, &BTreeMap::new());
        assert_eq!(status.removed, vec!["a"]);
        assert!(status.unstaged.is_empty());

        let recreated = working(&[("a", b"1")]);
        let status = WorkdirStatus::compute(&commit, &stage, &recreated);
        assert!(status.untracked.is_empty());
    }

    #[test]
    fn untracked_files_listed_and_filterable() {
        let tree = working(&[("notes.txt", b"n"), ("build.log", b"l")]);
        let mut status = WorkdirStatus::compute(&BTreeMap::new(), &Stage::new(), &tree);
        assert_eq!(status.untracked, vec!["build.log", "notes.txt"]);

        status.retain_untracked(|name| !name.ends_with(".log"));
        assert_eq!(status.untracked, vec!["notes.txt"]);
    }
}
