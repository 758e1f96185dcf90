use sprig_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed, write-once object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same bytes always produce the
///   same id, so a second write of identical content is a no-op.
/// - There is no update or delete operation.
/// - Reads verify the digest of what they return.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed id.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed id.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object that must exist.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Persist raw file content and return its digest.
    fn put_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write(&StoredObject::blob(data))
    }

    /// Read raw file content by digest.
    fn get_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.get(id)?.into_kind(id, ObjectKind::Blob)
    }

    /// Copy one object from `self` into `dest` unless `dest` already has it.
    ///
    /// Returns `true` if bytes were transferred.
    fn copy_to(&self, id: &ObjectId, dest: &dyn ObjectStore) -> StoreResult<bool> {
        if dest.exists(id)? {
            return Ok(false);
        }
        let object = self.get(id)?;
        dest.write(&object)?;
        Ok(true)
    }
}
