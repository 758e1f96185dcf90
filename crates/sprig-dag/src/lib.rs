//! Commits and the commit graph for sprig.
//!
//! A [`CommitBuilder`] collects a snapshot and its parents; finishing it
//! produces an immutable, content-addressed [`Commit`]. The [`CommitGraph`]
//! indexes finalized commits by id and answers history queries: first-parent
//! log, ancestor sets, ancestry checks, common-ancestor discovery and
//! parent-first ordering for transfer between stores.

pub mod commit;
pub mod dag;
pub mod error;

pub use commit::{Commit, CommitBuilder, Snapshot};
pub use dag::{AncestorStrategy, CommitGraph, FirstParentIter};
pub use error::{DagError, DagResult};
