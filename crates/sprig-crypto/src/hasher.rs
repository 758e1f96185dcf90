use sprig_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"sprig-blob-v1"`) that is fed to
/// the hash before the payload. A blob and a commit with identical bytes
/// therefore never share an id.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file content.
    pub const BLOB: Self = Self {
        domain: "sprig-blob-v1",
    };
    /// Hasher for serialized commit metadata.
    pub const COMMIT: Self = Self {
        domain: "sprig-commit-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Serialize `value` to canonical JSON and hash it.
    ///
    /// Returns the encoded bytes alongside the id so callers can persist the
    /// exact bytes that were hashed. Canonical here means the caller's types
    /// serialize deterministically (ordered maps, no floats).
    pub fn hash_json<T: serde::Serialize>(
        &self,
        value: &T,
    ) -> Result<(ObjectId, Vec<u8>), HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok((self.hash(&data), data))
    }

    /// Verify that data produces the expected object id.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::BLOB.hash(data), ContentHasher::BLOB.hash(data));
    }

    #[test]
    fn blob_and_commit_domains_differ() {
        let data = b"same content";
        assert_ne!(
            ContentHasher::BLOB.hash(data),
            ContentHasher::COMMIT.hash(data)
        );
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::BLOB.hash(b"original");
        assert!(ContentHasher::BLOB.verify(b"original", &id));
        assert!(!ContentHasher::BLOB.verify(b"tampered", &id));
    }

    #[test]
    fn hash_json_is_insertion_order_independent() {
        let mut first = BTreeMap::new();
        first.insert("b", 2);
        first.insert("a", 1);
        let mut second = BTreeMap::new();
        second.insert("a", 1);
        second.insert("b", 2);

        let (id1, bytes1) = ContentHasher::COMMIT.hash_json(&first).unwrap();
        let (id2, bytes2) = ContentHasher::COMMIT.hash_json(&second).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(bytes1, bytes2);
        assert!(ContentHasher::COMMIT.verify(&bytes1, &id1));
    }

    #[test]
    fn domain_tags() {
        assert_eq!(ContentHasher::BLOB.domain(), "sprig-blob-v1");
        assert_eq!(ContentHasher::COMMIT.domain(), "sprig-commit-v1");
    }
}
