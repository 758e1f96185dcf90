//! Repository layer for sprig.
//!
//! [`Repository`] ties the object store, the persisted state and stage
//! records, and the working tree together and exposes every command:
//! staging, committing, history, branches, checkout and reset, merge, and
//! remote fetch, push and pull.
//!
//! # On-disk layout
//!
//! ```text
//! <worktree>/.sprig/
//!     config.toml    RepoConfig
//!     state          commit index, branches, remotes (bincode)
//!     stage          pending additions and removals (bincode)
//!     objects/       content-addressed blobs and commits
//! ```
//!
//! Each collaborator sits behind a trait ([`ObjectStore`](sprig_store::ObjectStore),
//! [`RecordStore`], [`WorkingTree`]) with a filesystem and an in-memory
//! implementation, so every command can run without touching disk.

pub mod checkout;
pub mod config;
pub mod error;
pub mod merge;
pub mod records;
pub mod remote;
pub mod repository;
pub mod state;
pub mod worktree;

pub use config::{MergeConfig, RepoConfig, WorktreeConfig};
pub use error::{ErrorCategory, MergeBlock, RepoError, RepoResult};
pub use merge::MergeOutcome;
pub use records::{FsRecordStore, InMemoryRecordStore, RecordStore};
pub use remote::PullResult;
pub use repository::{Repository, StatusReport};
pub use state::RepoState;
pub use worktree::{FsWorkingTree, InMemoryWorkingTree, WorkingTree};

// Re-export the types callers handle directly.
pub use sprig_dag::{AncestorStrategy, Commit};
pub use sprig_index::{FileStatus, RemoveOutcome, StageChange, StatusEntry, WorkdirStatus};
pub use sprig_sync::{FetchResult, PushResult, RefUpdate, TransferReport};
pub use sprig_types::{Blob, ObjectId};

/// Name of the repository directory inside the working tree.
pub const SPRIG_DIR: &str = ".sprig";
/// Configuration file inside [`SPRIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Object store directory inside [`SPRIG_DIR`].
pub const OBJECTS_DIR: &str = "objects";
