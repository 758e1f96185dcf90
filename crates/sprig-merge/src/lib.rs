//! Merge engine for sprig.
//!
//! Merging works on whole snapshots, file by file, with blob identity
//! decided by content id:
//!
//! 1. [`reconcile`] compares the current tip, the other tip and their common
//!    ancestor and produces a [`MergePlan`] without touching any storage.
//! 2. [`MergePlan::materialize`] writes conflict marker content into the
//!    object store and yields the merged snapshot plus the working-tree
//!    updates the caller must apply.
//!
//! Conflicts are whole-file; see [`markers`].

pub mod error;
pub mod markers;
pub mod plan;

pub use error::{MergeError, MergeResult};
pub use markers::conflict_content;
pub use plan::{reconcile, MergePlan, MergedTree, Resolution};
