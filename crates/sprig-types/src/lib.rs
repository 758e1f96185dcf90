//! Foundation types for sprig.
//!
//! This crate provides the identity types shared by every other sprig crate.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 digest)
//! - [`Blob`]: A tracked file's content reference at one revision

pub mod blob;
pub mod error;
pub mod object;

pub use blob::Blob;
pub use error::TypeError;
pub use object::ObjectId;
