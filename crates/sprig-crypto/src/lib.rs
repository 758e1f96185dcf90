//! Content hashing for sprig.
//!
//! Provides the deterministic digest function every object identity in the
//! store is derived from: domain-separated BLAKE3 over raw bytes, or over a
//! canonical JSON encoding for structured records.
//!
//! All crypto operations wrap established libraries: no custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
