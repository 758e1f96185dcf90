//! Staging area for sprig.
//!
//! The [`Stage`] holds pending additions (file name to blob) and pending
//! removals (file names) between commits. The two sets are disjoint: staging
//! one kind of change for a name evicts the other.
//!
//! # Key Types
//!
//! - [`Stage`] -- The persisted staging area (BTreeMap/BTreeSet-backed)
//! - [`StageChange`] / [`RemoveOutcome`] -- What an add or remove did
//! - [`WorkdirStatus`] -- Result of status computation
//! - [`FileStatus`] -- Kind of unstaged change (Modified, Deleted)

pub mod error;
pub mod stage;
pub mod status;

pub use error::{IndexError, IndexResult};
pub use stage::{validate_path, RemoveOutcome, Stage, StageChange};
pub use status::{FileStatus, StatusEntry, WorkdirStatus};
