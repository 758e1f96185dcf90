use serde::{Deserialize, Serialize};
use sprig_crypto::ContentHasher;
use sprig_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Serialized commit metadata.
    Commit,
}

impl ObjectKind {
    /// Every kind, in lookup order.
    pub const ALL: [ObjectKind; 2] = [ObjectKind::Blob, ObjectKind::Commit];

    /// Directory / display name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Commit => "commit",
        }
    }

    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + opaque bytes.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// bytes; the kind only selects the hash domain and the storage namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The object's bytes, exactly as hashed.
    pub data: Vec<u8>,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// A blob holding raw file content.
    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        Self::new(ObjectKind::Blob, data.into())
    }

    /// A commit holding serialized commit metadata.
    pub fn commit(data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Commit, data)
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Compute the content-addressed id for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// Check that the bytes still hash to `id`.
    pub fn verify(&self, id: &ObjectId) -> StoreResult<()> {
        let computed = self.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(())
    }

    /// Unwrap the payload, failing if this is not an object of `kind`.
    pub fn into_kind(self, id: &ObjectId, kind: ObjectKind) -> StoreResult<Vec<u8>> {
        if self.kind != kind {
            return Err(StoreError::KindMismatch {
                id: *id,
                expected: kind,
                actual: self.kind,
            });
        }
        Ok(self.data)
    }
}
