use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Please pull down remote changes before pushing.")]
    NotFastForward { branch: String },

    #[error("commit graph error: {0}")]
    Dag(#[from] sprig_dag::DagError),

    #[error("store error: {0}")]
    Store(#[from] sprig_store::StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;
