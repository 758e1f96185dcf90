use sprig_types::ObjectId;

/// A branch pointer that moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefUpdate {
    pub name: String,
    pub old: Option<ObjectId>,
    pub new: ObjectId,
}

impl RefUpdate {
    /// Returns `true` if the pointer did not actually move.
    pub fn is_noop(&self) -> bool {
        self.old == Some(self.new)
    }
}

/// What one transfer copied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Ids of the commits copied, parents first.
    pub commits: Vec<ObjectId>,
    /// Number of blob objects that were missing on the receiving side.
    pub blobs_copied: usize,
}

impl TransferReport {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.blobs_copied == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    pub transfer: TransferReport,
    /// The local tracking branch (`<remote>/<branch>`).
    pub updated: RefUpdate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushResult {
    pub transfer: TransferReport,
    /// The branch on the remote.
    pub updated: RefUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_update_noop() {
        let id = ObjectId::from_bytes(b"tip");
        let same = RefUpdate { name: "main".into(), old: Some(id), new: id };
        assert!(same.is_noop());
        let created = RefUpdate { name: "main".into(), old: None, new: id };
        assert!(!created.is_noop());
    }

    #[test]
    fn transfer_report_defaults() {
        let r = TransferReport::default();
        assert!(r.is_empty());
        assert_eq!(r.blobs_copied, 0);
    }
}
