//! Filesystem object store: one immutable file per digest.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<kind>/<first 2 hex chars>/<remaining 62 hex chars>
//! ```
//!
//! Blob files hold the raw file bytes; commit files hold serialized commit
//! metadata. Each write lands in a temporary file in the target directory and
//! is renamed into place, so a reader never observes a partial object.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sprig_types::ObjectId;
use tracing::debug;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Object store backed by a directory tree.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) an object store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in ObjectKind::ALL {
            fs::create_dir_all(root.join(kind.as_str()))?;
        }
        Ok(Self { root })
    }

    /// The directory this store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding object `id` of the given kind.
    pub fn object_path(&self, kind: ObjectKind, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (prefix, suffix) = hex.split_at(2);
        self.root.join(kind.as_str()).join(prefix).join(suffix)
    }

    fn locate(&self, id: &ObjectId) -> Option<(ObjectKind, PathBuf)> {
        ObjectKind::ALL
            .into_iter()
            .map(|kind| (kind, self.object_path(kind, id)))
            .find(|(_, path)| path.is_file())
    }

    fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "object path has no parent"))?;
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let Some((kind, path)) = self.locate(id) else {
            return Ok(None);
        };
        let object = StoredObject::new(kind, fs::read(&path)?);
        object.verify(id)?;
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(object.kind, &id);
        if path.is_file() {
            return Ok(id);
        }
        Self::write_atomic(&path, &object.data)?;
        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size(), "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.locate(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn temp_store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_kind_directories() {
        let (_dir, store) = temp_store();
        assert!(store.root().join("blob").is_dir());
        assert!(store.root().join("commit").is_dir());
    }

    #[test]
    fn blob_file_holds_raw_bytes() {
        let (_dir, store) = temp_store();
        let id = store.put_blob(b"raw content").unwrap();
        let path = store.object_path(ObjectKind::Blob, &id);
        assert_eq!(fs::read(path).unwrap(), b"raw content");
        assert_eq!(store.get_blob(&id).unwrap(), b"raw content");
    }

    #[test]
    fn write_is_idempotent() {
        let (_dir, store) = temp_store();
        let id1 = store.put_blob(b"same").unwrap();
        let id2 = store.put_blob(b"same").unwrap();
        assert_eq!(id1, id2);
        let shard = store.object_path(ObjectKind::Blob, &id1);
        let entries = fs::read_dir(shard.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn commit_objects_are_found_by_id() {
        let (_dir, store) = temp_store();
        let id = store
            .write(&StoredObject::commit(b"{\"message\":\"m\"}".to_vec()))
            .unwrap();
        let object = store.get(&id).unwrap();
        assert_eq!(object.kind, ObjectKind::Commit);
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn missing_object() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_bytes(b"nope");
        assert!(store.read(&id).unwrap().is_none());
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn corrupted_file_is_reported() {
        let (_dir, store) = temp_store();
        let id = store.put_blob(b"pristine").unwrap();
        fs::write(store.object_path(ObjectKind::Blob, &id), b"corrupted").unwrap();

        let err = store.read(&id).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn reopen_sees_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let id = FsObjectStore::open(dir.path())
            .unwrap()
            .put_blob(b"persisted")
            .unwrap();
        let reopened = FsObjectStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_blob(&id).unwrap(), b"persisted");
    }

    #[test]
    fn copy_between_stores() {
        let (_a, src) = temp_store();
        let (_b, dst) = temp_store();
        let id = src.put_blob(b"travels").unwrap();
        assert!(src.copy_to(&id, &dst).unwrap());
        assert_eq!(dst.get_blob(&id).unwrap(), b"travels");
    }
}
