//! Named references for sprig.
//!
//! Branches are mutable pointers to commit ids; exactly one of them is the
//! current branch. Remotes map a short name to the path of another store.
//! Both live in a [`RefTable`], a plain value that is persisted as part of
//! the repository state record.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`names`]: Branch/remote name validation
//! - [`table`]: The [`RefTable`] itself

pub mod error;
pub mod names;
pub mod table;

pub use error::{RefError, Result};
pub use names::{tracking_branch_name, validate_branch_name, validate_remote_name};
pub use table::RefTable;
