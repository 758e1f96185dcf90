//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefError {
    /// The branch does not exist.
    #[error("A branch with that name does not exist.")]
    BranchNotFound { name: String },

    /// A branch with this name already exists.
    #[error("A branch with that name already exists.")]
    BranchExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The remote name is invalid.
    #[error("invalid remote name: {name}: {reason}")]
    InvalidRemoteName { name: String, reason: String },

    /// Cannot delete the currently checked-out branch.
    #[error("Cannot remove the current branch.")]
    DeleteCurrentBranch { name: String },

    /// No remote is registered under this name.
    #[error("A remote with that name does not exist.")]
    RemoteNotFound { name: String },

    /// A remote with this name is already registered.
    #[error("A remote with that name already exists.")]
    RemoteExists { name: String },
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
