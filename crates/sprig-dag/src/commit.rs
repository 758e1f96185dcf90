//! Commit builder and finalized commit.
//!
//! A commit starts life as a [`CommitBuilder`]: a mutable snapshot plus parent
//! links. [`CommitBuilder::finish`] stamps the message and time, hashes the
//! resulting metadata and hands back an immutable [`Commit`]. Nothing on
//! `Commit` allows mutation, so a value registered under its id always hashes
//! to that id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprig_crypto::ContentHasher;
use sprig_store::{ObjectKind, StoredObject};
use sprig_types::{Blob, ObjectId};

use crate::error::{DagError, DagResult};

/// Complete mapping from tracked file name to its blob.
pub type Snapshot = BTreeMap<String, Blob>;

/// Hashed fields of a commit, serialized as canonical JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct CommitBody {
    parent: Option<ObjectId>,
    second_parent: Option<ObjectId>,
    message: String,
    timestamp: DateTime<Utc>,
    snapshot: Snapshot,
}

impl CommitBody {
    fn hash(&self) -> DagResult<(ObjectId, Vec<u8>)> {
        ContentHasher::COMMIT
            .hash_json(self)
            .map_err(|e| DagError::Serialization(e.to_string()))
    }
}

/// A commit under construction.
#[derive(Clone, Debug, Default)]
pub struct CommitBuilder {
    parent: Option<ObjectId>,
    second_parent: Option<ObjectId>,
    snapshot: Snapshot,
}

impl CommitBuilder {
    /// A root commit with an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child of `parent`, starting from a copy of its snapshot.
    pub fn on_top_of(parent: &Commit) -> Self {
        Self {
            parent: Some(parent.id),
            second_parent: None,
            snapshot: parent.body.snapshot.clone(),
        }
    }

    /// Record a second parent, making this a merge commit.
    pub fn with_second_parent(mut self, id: ObjectId) -> Self {
        self.second_parent = Some(id);
        self
    }

    /// Replace the whole snapshot.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Track `blob` under its path, replacing any previous version.
    pub fn insert(&mut self, blob: Blob) -> Option<Blob> {
        self.snapshot.insert(blob.path.clone(), blob)
    }

    /// Stop tracking `name`.
    pub fn remove(&mut self, name: &str) -> Option<Blob> {
        self.snapshot.remove(name)
    }

    /// The snapshot as built so far.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Finalize: stamp message and time and compute the commit id.
    pub fn finish(self, message: impl Into<String>, timestamp: DateTime<Utc>) -> DagResult<Commit> {
        let body = CommitBody {
            parent: self.parent,
            second_parent: self.second_parent,
            message: message.into(),
            timestamp,
            snapshot: self.snapshot,
        };
        let (id, _) = body.hash()?;
        Ok(Commit { id, body })
    }
}

/// A finalized, content-addressed commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    id: ObjectId,
    body: CommitBody,
}

impl Commit {
    /// The commit's content-addressed id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// First parent, `None` for a root commit.
    pub fn parent(&self) -> Option<ObjectId> {
        self.body.parent
    }

    /// Second parent, present only on merge commits.
    pub fn second_parent(&self) -> Option<ObjectId> {
        self.body.second_parent
    }

    /// All parents, first parent first.
    pub fn parents(&self) -> impl Iterator<Item = ObjectId> {
        self.body.parent.into_iter().chain(self.body.second_parent)
    }

    pub fn is_merge(&self) -> bool {
        self.body.second_parent.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.body.parent.is_none()
    }

    pub fn message(&self) -> &str {
        &self.body.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.body.timestamp
    }

    /// Every tracked file at this point in history.
    pub fn snapshot(&self) -> &Snapshot {
        &self.body.snapshot
    }

    /// The blob tracked under `name`, if any.
    pub fn blob(&self, name: &str) -> Option<&Blob> {
        self.body.snapshot.get(name)
    }

    /// Returns `true` if `name` is tracked by this commit.
    pub fn tracks(&self, name: &str) -> bool {
        self.body.snapshot.contains_key(name)
    }

    /// Re-hash the metadata and check it still matches the id.
    pub fn verify(&self) -> DagResult<()> {
        let (computed, _) = self.body.hash()?;
        if computed != self.id {
            return Err(DagError::IdMismatch {
                expected: self.id,
                computed,
            });
        }
        Ok(())
    }

    /// Encode for the object store. The stored id equals [`Commit::id`].
    pub fn to_stored_object(&self) -> DagResult<StoredObject> {
        let (_, bytes) = self.body.hash()?;
        Ok(StoredObject::commit(bytes))
    }

    /// Decode a commit read from the object store under `id`.
    pub fn from_stored_object(id: ObjectId, object: StoredObject) -> DagResult<Self> {
        let data = object.into_kind(&id, ObjectKind::Commit)?;
        let body: CommitBody =
            serde_json::from_slice(&data).map_err(|e| DagError::Serialization(e.to_string()))?;
        let commit = Self { id, body };
        commit.verify()?;
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_store::{InMemoryObjectStore, ObjectStore};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn blob(name: &str, content: &[u8]) -> Blob {
        Blob::new(ContentHasher::BLOB.hash(content), name, 1)
    }

    #[test]
    fn same_content_same_id() {
        let mut a = CommitBuilder::new();
        a.insert(blob("f", b"1"));
        let mut b = CommitBuilder::new();
        b.insert(blob("f", b"1"));

        let a = a.finish("c1", at(100)).unwrap();
        let b = b.finish("c1", at(100)).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn every_field_feeds_the_id() {
        let base = CommitBuilder::new().finish("m", at(1)).unwrap();
        let other_message = CommitBuilder::new().finish("n", at(1)).unwrap();
        let other_time = CommitBuilder::new().finish("m", at(2)).unwrap();
        let child = CommitBuilder::on_top_of(&base).finish("m", at(1)).unwrap();

        assert_ne!(base.id(), other_message.id());
        assert_ne!(base.id(), other_time.id());
        assert_ne!(base.id(), child.id());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = CommitBuilder::new();
        a.insert(blob("x", b"x"));
        a.insert(blob("y", b"y"));
        let mut b = CommitBuilder::new();
        b.insert(blob("y", b"y"));
        b.insert(blob("x", b"x"));

        assert_eq!(
            a.finish("m", at(5)).unwrap().id(),
            b.finish("m", at(5)).unwrap().id()
        );
    }

    #[test]
    fn child_inherits_snapshot() {
        let mut root = CommitBuilder::new();
        root.insert(blob("f", b"1"));
        root.insert(blob("g", b"1"));
        let root = root.finish("root", at(1)).unwrap();

        let mut child = CommitBuilder::on_top_of(&root);
        child.remove("g");
        let child = child.finish("child", at(2)).unwrap();

        assert_eq!(child.parent(), Some(root.id()));
        assert!(child.tracks("f"));
        assert!(!child.tracks("g"));
        assert!(root.tracks("g"));
    }

    #[test]
    fn merge_commit_has_two_parents() {
        let a = CommitBuilder::new().finish("a", at(1)).unwrap();
        let b = CommitBuilder::new().finish("b", at(2)).unwrap();
        let merge = CommitBuilder::on_top_of(&a)
            .with_second_parent(b.id())
            .finish("Merged b into a.", at(3))
            .unwrap();

        assert!(merge.is_merge());
        assert_eq!(merge.parents().collect::<Vec<_>>(), vec![a.id(), b.id()]);
    }

    #[test]
    fn stored_object_id_matches_commit_id() {
        let store = InMemoryObjectStore::new();
        let mut builder = CommitBuilder::new();
        builder.insert(blob("f", b"content"));
        let commit = builder.finish("c", at(10)).unwrap();

        let id = store.write(&commit.to_stored_object().unwrap()).unwrap();
        assert_eq!(id, commit.id());

        let decoded = Commit::from_stored_object(id, store.get(&id).unwrap()).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn decoding_under_wrong_id_fails() {
        let commit = CommitBuilder::new().finish("c", at(10)).unwrap();
        let wrong = ObjectId::from_bytes(b"elsewhere");
        let err = Commit::from_stored_object(wrong, commit.to_stored_object().unwrap()).unwrap_err();
        assert!(matches!(err, DagError::IdMismatch { .. }));
    }

    #[test]
    fn decoding_a_blob_fails() {
        let object = StoredObject::blob(b"not a commit".to_vec());
        let id = object.compute_id();
        let err = Commit::from_stored_object(id, object).unwrap_err();
        assert!(matches!(err, DagError::Store(_)));
    }
}
