//! Error types for the index crate.

/// Errors that can occur during stage operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The file is neither staged nor tracked.
    #[error("No reason to remove the file.")]
    NothingToRemove(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] sprig_store::StoreError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
