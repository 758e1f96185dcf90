//! Content-addressed object storage for sprig.
//!
//! This crate implements a hash-keyed, write-once object store analogous to
//! git's `.git/objects/` directory. File content (blobs) and serialized
//! commit metadata are stored as immutable objects identified by their
//! BLAKE3 digest, domain-separated by object kind.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- one file per object under a directory root
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written. There is no update or delete.
//! 2. Writing identical bytes twice is a no-op returning the same id.
//! 3. Reads re-verify the digest; a mismatch is surfaced, never repaired.
//! 4. The store never interprets object contents.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{ObjectKind, StoredObject};
pub use traits::ObjectStore;
