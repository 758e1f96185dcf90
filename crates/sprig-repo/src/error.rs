use std::fmt;

use thiserror::Error;

use sprig_dag::DagError;
use sprig_index::IndexError;
use sprig_merge::MergeError;
use sprig_refs::RefError;
use sprig_store::StoreError;
use sprig_sync::SyncError;

/// Why a merge was refused before anything changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeBlock {
    /// The stage is not empty.
    UncommittedChanges,
    /// The given branch is the current branch.
    SelfMerge,
    /// An untracked working file would be overwritten.
    UntrackedFile,
}

impl fmt::Display for MergeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UncommittedChanges => "You have uncommitted changes.",
            Self::SelfMerge => "Cannot merge a branch with itself.",
            Self::UntrackedFile => {
                "There is an untracked file in the way; delete it, or add and commit it first."
            }
        })
    }
}

/// Broad classes of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or repository state the caller can correct. Nothing was
    /// changed.
    Precondition,
    /// Missing objects, malformed records or I/O failure.
    Integrity,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not in an initialized sprig directory.")]
    NotInitialized,

    #[error("A sprig version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NothingToCommit,

    #[error("No reason to remove the file.")]
    NothingToRemove(String),

    #[error("No commits yet.")]
    NoCommits,

    #[error("A branch with that name does not exist.")]
    BranchNotFound(String),

    #[error("A branch with that name already exists.")]
    BranchExists(String),

    #[error("Cannot remove the current branch.")]
    CannotRemoveCurrentBranch(String),

    #[error("No need to checkout the current branch.")]
    AlreadyOnBranch(String),

    #[error("No commit with that id exists.")]
    NoSuchCommit(String),

    #[error("Commit id {0} is ambiguous.")]
    AmbiguousCommit(String),

    #[error("File does not exist in that commit.")]
    FileNotInCommit(String),

    #[error("File does not exist.")]
    FileNotFound(String),

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedFileConflict(String),

    #[error("{0}")]
    MergeBlocked(MergeBlock),

    #[error("A remote with that name does not exist.")]
    RemoteNotFound(String),

    #[error("A remote with that name already exists.")]
    RemoteExists(String),

    #[error("Remote directory not found.")]
    RemoteUnreachable(String),

    #[error("That remote does not have that branch.")]
    RemoteBranchNotFound(String),

    #[error("Please pull down remote changes before pushing.")]
    NotAncestor(String),

    #[error("{0}")]
    InvalidName(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("commit graph error: {0}")]
    Graph(DagError),

    #[error("malformed {record} record: {reason}")]
    CorruptRecord { record: &'static str, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(_)
            | Self::Graph(_)
            | Self::CorruptRecord { .. }
            | Self::Config(_)
            | Self::Io(_) => ErrorCategory::Integrity,
            _ => ErrorCategory::Precondition,
        }
    }

    pub fn is_precondition(&self) -> bool {
        self.category() == ErrorCategory::Precondition
    }
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<DagError> for RepoError {
    fn from(e: DagError) -> Self {
        match e {
            DagError::NoMatch(prefix) => Self::NoSuchCommit(prefix),
            DagError::AmbiguousPrefix { prefix, .. } => Self::AmbiguousCommit(prefix),
            DagError::Store(e) => Self::Store(e),
            other => Self::Graph(other),
        }
    }
}

impl From<RefError> for RepoError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::BranchNotFound { name } => Self::BranchNotFound(name),
            RefError::BranchExists { name } => Self::BranchExists(name),
            RefError::DeleteCurrentBranch { name } => Self::CannotRemoveCurrentBranch(name),
            RefError::RemoteNotFound { name } => Self::RemoteNotFound(name),
            RefError::RemoteExists { name } => Self::RemoteExists(name),
            e @ (RefError::InvalidBranchName { .. } | RefError::InvalidRemoteName { .. }) => {
                Self::InvalidName(e.to_string())
            }
        }
    }
}

impl From<IndexError> for RepoError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::NothingToRemove(name) => Self::NothingToRemove(name),
            e @ IndexError::InvalidPath(_) => Self::InvalidName(e.to_string()),
            IndexError::Store(e) => Self::Store(e),
        }
    }
}

impl From<MergeError> for RepoError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::Store(e) => Self::Store(e),
        }
    }
}

impl From<SyncError> for RepoError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotFastForward { branch } => Self::NotAncestor(branch),
            SyncError::Dag(e) => e.into(),
            SyncError::Store(e) => Self::Store(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_types::ObjectId;

    #[test]
    fn categories() {
        assert_eq!(RepoError::EmptyMessage.category(), ErrorCategory::Precondition);
        assert_eq!(
            RepoError::MergeBlocked(MergeBlock::SelfMerge).category(),
            ErrorCategory::Precondition
        );
        let missing = RepoError::from(StoreError::NotFound(ObjectId::from_bytes(b"x")));
        assert_eq!(missing.category(), ErrorCategory::Integrity);
        assert!(!missing.is_precondition());
    }

    #[test]
    fn prefix_errors_become_preconditions() {
        let e = RepoError::from(DagError::NoMatch("abc".into()));
        assert!(matches!(e, RepoError::NoSuchCommit(_)));
        let e = RepoError::from(DagError::AmbiguousPrefix {
            prefix: "a".into(),
            count: 2,
        });
        assert_eq!(e.to_string(), "Commit id a is ambiguous.");
    }

    #[test]
    fn ref_errors_map_to_named_variants() {
        let e = RepoError::from(RefError::DeleteCurrentBranch {
            name: "main".into(),
        });
        assert!(matches!(e, RepoError::CannotRemoveCurrentBranch(_)));
        let e = RepoError::from(RefError::InvalidBranchName {
            name: "a..b".into(),
            reason: "must not contain '..'".into(),
        });
        assert!(matches!(e, RepoError::InvalidName(_)));
    }

    #[test]
    fn merge_block_messages() {
        assert_eq!(
            RepoError::MergeBlocked(MergeBlock::UncommittedChanges).to_string(),
            "You have uncommitted changes."
        );
    }
}
