//! Error types for the merge engine.

/// Errors that can occur while materializing a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A blob needed for conflict markers could not be read or written.
    #[error("store error: {0}")]
    Store(#[from] sprig_store::StoreError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
