use std::collections::BTreeSet;

use tracing::{debug, info};

use sprig_dag::{Commit, CommitGraph};
use sprig_store::ObjectStore;
use sprig_types::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::types::TransferReport;

/// One side of a transfer: a commit graph and the store holding its objects.
pub struct Endpoint<'a> {
    pub graph: &'a CommitGraph,
    pub store: &'a dyn ObjectStore,
}

/// Copies commit ancestry from one store into another.
pub struct Transfer;

impl Transfer {
    /// Commits reachable from `tip` in `source` that `dest` lacks, parents
    /// first. Ids in `known` are treated as present on the receiving side.
    pub fn plan<'a>(
        source: &'a CommitGraph,
        tip: &ObjectId,
        dest: &CommitGraph,
        known: &BTreeSet<ObjectId>,
    ) -> SyncResult<Vec<&'a Commit>> {
        let missing = source.missing_ancestry(tip, |id| dest.contains(id) || known.contains(id))?;
        debug!(tip = %tip.short_hex(), missing = missing.len(), "planned transfer");
        Ok(missing)
    }

    /// Copy the ancestry of `tip` from `source` into `dest_graph`/`dest_store`.
    ///
    /// For every missing commit, each blob its snapshot references is copied
    /// unless already present, then the commit object itself is written and
    /// the commit inserted into the receiving graph.
    pub fn copy(
        source: Endpoint<'_>,
        tip: &ObjectId,
        dest_graph: &mut CommitGraph,
        dest_store: &dyn ObjectStore,
        known: &BTreeSet<ObjectId>,
    ) -> SyncResult<TransferReport> {
        let plan = Self::plan(source.graph, tip, dest_graph, known)?;
        let mut report = TransferReport::default();

        for commit in plan {
            commit.verify()?;
            for blob in commit.snapshot().values() {
                if source.store.copy_to(&blob.id, dest_store)? {
                    report.blobs_copied += 1;
                }
            }
            dest_store.write(&commit.to_stored_object()?)?;
            dest_graph.insert(commit.clone())?;
            report.commits.push(commit.id());
        }

        info!(
            tip = %tip.short_hex(),
            commits = report.commits.len(),
            blobs = report.blobs_copied,
            "transferred commits"
        );
        Ok(report)
    }
}

/// Check that moving `branch` from `remote_tip` to `local_tip` only advances
/// it: the remote tip must be an ancestor of the local tip as far as `graph`
/// knows. A branch the remote lacks can always be created.
pub fn ensure_fast_forward(
    graph: &CommitGraph,
    branch: &str,
    remote_tip: Option<&ObjectId>,
    local_tip: &ObjectId,
) -> SyncResult<()> {
    match remote_tip {
        Some(remote) if !graph.is_ancestor(remote, local_tip) => Err(SyncError::NotFastForward {
            branch: branch.to_string(),
        }),
        _ => Ok(()),
    }
}
