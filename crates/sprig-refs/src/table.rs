//! The [`RefTable`]: branches, current branch and remotes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use sprig_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, validate_remote_name};

/// Named pointers into the commit graph.
///
/// The current branch may name a branch that does not exist yet: a fresh
/// repository has no commits, and the first commit creates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTable {
    branches: BTreeMap<String, ObjectId>,
    current: String,
    remotes: BTreeMap<String, PathBuf>,
}

impl RefTable {
    /// An empty table whose current branch will be `default_branch`.
    pub fn new(default_branch: &str) -> Result<Self> {
        validate_branch_name(default_branch)?;
        Ok(Self {
            branches: BTreeMap::new(),
            current: default_branch.to_string(),
            remotes: BTreeMap::new(),
        })
    }

    // ---------------------------------------------------------------
    // Branches
    // ---------------------------------------------------------------

    /// Name of the current branch.
    pub fn current_branch(&self) -> &str {
        &self.current
    }

    /// Tip of the current branch, `None` before the first commit.
    pub fn head(&self) -> Option<ObjectId> {
        self.branches.get(&self.current).copied()
    }

    /// Tip of a named branch.
    pub fn branch(&self, name: &str) -> Option<ObjectId> {
        self.branches.get(name).copied()
    }

    /// Tip of a branch that must exist.
    pub fn require_branch(&self, name: &str) -> Result<ObjectId> {
        self.branch(name).ok_or_else(|| RefError::BranchNotFound {
            name: name.to_string(),
        })
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// All branches, sorted by name.
    pub fn branches(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.branches.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Create a new branch at `at`. Fails if it already exists.
    pub fn create_branch(&mut self, name: &str, at: ObjectId) -> Result<()> {
        validate_branch_name(name)?;
        if self.branches.contains_key(name) {
            return Err(RefError::BranchExists {
                name: name.to_string(),
            });
        }
        debug!(branch = name, at = %at.short_hex(), "created branch");
        self.branches.insert(name.to_string(), at);
        Ok(())
    }

    /// Point `name` at `at`, creating the branch if needed.
    pub fn set_branch(&mut self, name: &str, at: ObjectId) -> Result<()> {
        validate_branch_name(name)?;
        debug!(branch = name, at = %at.short_hex(), "moved branch");
        self.branches.insert(name.to_string(), at);
        Ok(())
    }

    /// Advance the current branch to `at`.
    pub fn advance_current(&mut self, at: ObjectId) {
        debug!(branch = %self.current, at = %at.short_hex(), "advanced current branch");
        self.branches.insert(self.current.clone(), at);
    }

    /// Delete a branch pointer. The current branch cannot be deleted.
    pub fn delete_branch(&mut self, name: &str) -> Result<ObjectId> {
        if name == self.current {
            return Err(RefError::DeleteCurrentBranch {
                name: name.to_string(),
            });
        }
        self.branches
            .remove(name)
            .ok_or_else(|| RefError::BranchNotFound {
                name: name.to_string(),
            })
    }

    /// Make an existing branch current.
    pub fn switch_to(&mut self, name: &str) -> Result<()> {
        if !self.branches.contains_key(name) {
            return Err(RefError::BranchNotFound {
                name: name.to_string(),
            });
        }
        self.current = name.to_string();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Remotes
    // ---------------------------------------------------------------

    /// Path of a registered remote.
    pub fn remote(&self, name: &str) -> Result<&Path> {
        self.remotes
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| RefError::RemoteNotFound {
                name: name.to_string(),
            })
    }

    /// All remotes, sorted by name.
    pub fn remotes(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.remotes.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    /// Register a remote. Fails if the name is taken.
    pub fn add_remote(&mut self, name: &str, path: impl Into<PathBuf>) -> Result<()> {
        validate_remote_name(name)?;
        if self.remotes.contains_key(name) {
            return Err(RefError::RemoteExists {
                name: name.to_string(),
            });
        }
        self.remotes.insert(name.to_string(), path.into());
        Ok(())
    }

    /// Forget a remote. Tracking branches fetched from it are kept.
    pub fn remove_remote(&mut self, name: &str) -> Result<PathBuf> {
        self.remotes
            .remove(name)
            .ok_or_else(|| RefError::RemoteNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    #[test]
    fn fresh_table_has_no_head() {
        let refs = RefTable::new("main").unwrap();
        assert_eq!(refs.current_branch(), "main");
        assert!(refs.head().is_none());
        assert!(!refs.has_branch("main"));
    }

    #[test]
    fn invalid_default_branch_rejected() {
        assert!(matches!(
            RefTable::new("bad..name"),
            Err(RefError::InvalidBranchName { .. })
        ));
    }

    #[test]
    fn advance_creates_current_branch() {
        let mut refs = RefTable::new("main").unwrap();
        refs.advance_current(oid(1));
        assert_eq!(refs.head(), Some(oid(1)));
        refs.advance_current(oid(2));
        assert_eq!(refs.branch("main"), Some(oid(2)));
    }

    #[test]
    fn create_branch_rejects_duplicates() {
        let mut refs = RefTable::new("main").unwrap();
        refs.advance_current(oid(1));
        refs.create_branch("dev", oid(1)).unwrap();
        assert_eq!(
            refs.create_branch("dev", oid(2)),
            Err(RefError::BranchExists { name: "dev".into() })
        );
        assert_eq!(refs.branch("dev"), Some(oid(1)));
    }

    #[test]
    fn switch_and_delete() {
        let mut refs = RefTable::new("main").unwrap();
        refs.advance_current(oid(1));
        refs.create_branch("dev", oid(1)).unwrap();

        assert!(matches!(
            refs.switch_to("nope"),
            Err(RefError::BranchNotFound { .. })
        ));
        refs.switch_to("dev").unwrap();
        assert_eq!(refs.current_branch(), "dev");

        assert!(matches!(
            refs.delete_branch("dev"),
            Err(RefError::DeleteCurrentBranch { .. })
        ));
        assert_eq!(refs.delete_branch("main").unwrap(), oid(1));
        assert!(matches!(
            refs.delete_branch("main"),
            Err(RefError::BranchNotFound { .. })
        ));
    }

    #[test]
    fn branches_are_sorted() {
        let mut refs = RefTable::new("main").unwrap();
        refs.set_branch("zeta", oid(1)).unwrap();
        refs.set_branch("alpha", oid(2)).unwrap();
        refs.set_branch("origin/main", oid(3)).unwrap();
        let names: Vec<&str> = refs.branches().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "origin/main", "zeta"]);
    }

    #[test]
    fn remotes_lifecycle() {
        let mut refs = RefTable::new("main").unwrap();
        refs.add_remote("origin", "/tmp/other/.sprig").unwrap();
        assert_eq!(refs.remote("origin").unwrap(), Path::new("/tmp/other/.sprig"));
        assert!(matches!(
            refs.add_remote("origin", "/elsewhere"),
            Err(RefError::RemoteExists { .. })
        ));
        assert!(matches!(
            refs.add_remote("a/b", "/x"),
            Err(RefError::InvalidRemoteName { .. })
        ));

        refs.remove_remote("origin").unwrap();
        assert!(matches!(
            refs.remote("origin"),
            Err(RefError::RemoteNotFound { .. })
        ));
        assert!(refs.remove_remote("origin").is_err());
    }

    #[test]
    fn survives_bincode() {
        let mut refs = RefTable::new("main").unwrap();
        refs.advance_current(oid(7));
        refs.add_remote("origin", "/srv/repo/.sprig").unwrap();
        let bytes = bincode::serialize(&refs).unwrap();
        let decoded: RefTable = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, refs);
    }
}
