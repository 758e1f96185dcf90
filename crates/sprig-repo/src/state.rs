//! The repository state record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use sprig_dag::{Commit, CommitGraph};
use sprig_refs::RefTable;
use sprig_types::ObjectId;

use crate::error::{RepoError, RepoResult};

/// Everything about a repository except the stage and the objects:
/// the commit index, branches and remotes, and the ids imported by fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub graph: CommitGraph,
    pub refs: RefTable,
    /// Commit ids ever imported from a remote.
    pub known_ids: BTreeSet<ObjectId>,
}

impl RepoState {
    /// State of a freshly initialized repository.
    pub fn new(default_branch: &str) -> RepoResult<Self> {
        Ok(Self {
            graph: CommitGraph::new(),
            refs: RefTable::new(default_branch)?,
            known_ids: BTreeSet::new(),
        })
    }

    /// Tip of the current branch, `None` before the first commit.
    pub fn head(&self) -> RepoResult<Option<&Commit>> {
        match self.refs.head() {
            Some(id) => Ok(Some(self.graph.require(&id)?)),
            None => Ok(None),
        }
    }

    /// Tip of the current branch, which must exist.
    pub fn require_head(&self) -> RepoResult<&Commit> {
        self.head()?.ok_or(RepoError::NoCommits)
    }

    /// Tip of a named branch.
    pub fn branch_tip(&self, name: &str) -> RepoResult<&Commit> {
        let id = self.refs.require_branch(name)?;
        Ok(self.graph.require(&id)?)
    }

    /// Check that every branch resolves and the graph is well formed.
    pub fn validate(&self) -> RepoResult<()> {
        self.graph.validate()?;
        for (_, id) in self.refs.branches() {
            self.graph.require(&id)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> RepoResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| RepoError::CorruptRecord {
            record: "state",
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(data: &[u8]) -> RepoResult<Self> {
        bincode::deserialize(data).map_err(|e| RepoError::CorruptRecord {
            record: "state",
            reason: e.to_string(),
        })
    }
}
