//! Synchronization between sprig stores.
//!
//! A remote is another store reached through a path, so fetch and push are
//! local copies: the commits of one graph that the other side lacks are
//! copied parent-first, each with every blob its snapshot references, and
//! inserted into the receiving graph. Every commit is re-hashed before it is
//! accepted.

pub mod error;
pub mod transfer;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use transfer::{ensure_fast_forward, Endpoint, Transfer};
pub use types::{FetchResult, PushResult, RefUpdate, TransferReport};
