//! Error types for commit and graph operations.

use sprig_store::StoreError;
use sprig_types::ObjectId;

/// Errors that can occur during commit-graph operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A referenced commit was not found in the graph.
    #[error("no commit with id {0}")]
    CommitNotFound(ObjectId),

    /// A parent reference points to a commit the graph does not hold.
    #[error("dangling parent reference: commit {commit} references missing parent {parent}")]
    DanglingParent {
        /// The commit containing the bad reference.
        commit: ObjectId,
        /// The missing parent.
        parent: ObjectId,
    },

    /// A commit's metadata no longer hashes to its recorded id.
    #[error("commit {expected} hashes to {computed}")]
    IdMismatch {
        /// The id the commit was registered under.
        expected: ObjectId,
        /// The id its metadata actually hashes to.
        computed: ObjectId,
    },

    /// No commit id starts with the given prefix.
    #[error("no commit matches prefix {0:?}")]
    NoMatch(String),

    /// More than one commit id starts with the given prefix.
    #[error("prefix {prefix:?} matches {count} commits")]
    AmbiguousPrefix {
        /// The abbreviated id that was looked up.
        prefix: String,
        /// How many commits it matched.
        count: usize,
    },

    /// Commit metadata could not be encoded or decoded.
    #[error("commit serialization error: {0}")]
    Serialization(String),

    /// The object store failed while reading or writing a commit.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result alias for graph operations.
pub type DagResult<T> = Result<T, DagError>;
