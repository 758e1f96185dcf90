//! The blob record: which content a tracked file had at one revision.

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// A tracked file's content reference.
///
/// The bytes themselves live in the object store under `id`. Two blobs with
/// identical bytes carry the same `id` regardless of `path` or `revision`;
/// equality checks between versions of a file must compare [`Blob::id`], never
/// the whole record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Digest of the file content.
    pub id: ObjectId,
    /// Working-tree path the content was captured from.
    pub path: String,
    /// Per-file counter bumped whenever the file's content changes.
    ///
    /// Only meaningful between versions of the same path.
    pub revision: u32,
}

impl Blob {
    /// Create a blob record.
    pub fn new(id: ObjectId, path: impl Into<String>, revision: u32) -> Self {
        Self {
            id,
            path: path.into(),
            revision,
        }
    }

    /// The revision a new version of this file should carry.
    pub fn next_revision(&self) -> u32 {
        self.revision.saturating_add(1)
    }

    /// Returns `true` if both records name the same content.
    pub fn same_content(&self, other: &Blob) -> bool {
        self.id == other.id
    }
}
