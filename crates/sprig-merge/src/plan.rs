//! Three-way reconciliation of snapshots.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use sprig_dag::Snapshot;
use sprig_store::ObjectStore;
use sprig_types::{Blob, ObjectId};

use crate::error::MergeResult;
use crate::markers::conflict_content;

/// How one path is resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The current side's version stands (changed only here, changed the
    /// same way on both sides, or unchanged everywhere).
    KeepOurs,
    /// Only the other side changed the file; take its version.
    TakeTheirs(Blob),
    /// Only the other side changed the file, by deleting it.
    Delete,
    /// Both sides changed the file differently. `None` marks a deletion.
    Conflict {
        ours: Option<Blob>,
        theirs: Option<Blob>,
    },
}

/// Per-path resolutions for every file in any of the three snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    resolutions: BTreeMap<String, Resolution>,
}

/// Result of applying a plan: the merged snapshot and what the working tree
/// must do to match it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedTree {
    /// Snapshot for the merge commit.
    pub snapshot: Snapshot,
    /// Files to (over)write, with the blob holding their new content.
    pub writes: BTreeMap<String, Blob>,
    /// Tracked files to delete from the working tree.
    pub deletes: Vec<String>,
    /// Paths left with conflict markers.
    pub conflicts: Vec<String>,
}

fn id_of(blob: Option<&Blob>) -> Option<ObjectId> {
    blob.map(|b| b.id)
}

/// Decide every path in `ours`, `theirs` and `base`.
///
/// Blob identity is the content id; `None` stands for an absent file.
///
/// | ours vs base | theirs vs base | result |
/// |---|---|---|
/// | any | same as ours | keep ours |
/// | unchanged | changed | take theirs (or delete) |
/// | changed | unchanged | keep ours |
/// | changed | changed differently | conflict |
pub fn reconcile(ours: &Snapshot, theirs: &Snapshot, base: &Snapshot) -> MergePlan {
    let names: BTreeSet<&String> = ours.keys().chain(theirs.keys()).chain(base.keys()).collect();

    let resolutions = names
        .into_iter()
        .map(|name| {
            let a = ours.get(name);
            let b = theirs.get(name);
            let l = base.get(name);
            let resolution = if id_of(a) == id_of(b) || id_of(l) == id_of(b) {
                Resolution::KeepOurs
            } else if id_of(l) == id_of(a) {
                match b {
                    Some(blob) => Resolution::TakeTheirs(blob.clone()),
                    None => Resolution::Delete,
                }
            } else {
                Resolution::Conflict {
                    ours: a.cloned(),
                    theirs: b.cloned(),
                }
            };
            (name.clone(), resolution)
        })
        .collect();

    MergePlan { resolutions }
}

impl MergePlan {
    /// Every path with its resolution, sorted by path.
    pub fn resolutions(&self) -> &BTreeMap<String, Resolution> {
        &self.resolutions
    }

    pub fn resolution(&self, name: &str) -> Option<&Resolution> {
        self.resolutions.get(name)
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflicts().next().is_some()
    }

    /// Paths that will be left with conflict markers.
    pub fn conflicts(&self) -> impl Iterator<Item = &str> {
        self.resolutions
            .iter()
            .filter(|(_, r)| matches!(r, Resolution::Conflict { .. }))
            .map(|(name, _)| name.as_str())
    }

    /// Paths whose working copy the merge will write.
    pub fn written_paths(&self) -> impl Iterator<Item = &str> {
        self.resolutions
            .iter()
            .filter(|(_, r)| matches!(r, Resolution::TakeTheirs(_) | Resolution::Conflict { .. }))
            .map(|(name, _)| name.as_str())
    }

    /// Build the merged snapshot on top of `ours`.
    ///
    /// Conflict marker content is written to `store` as a new blob whose
    /// revision is one past the highest revision of either side.
    pub fn materialize(&self, ours: &Snapshot, store: &dyn ObjectStore) -> MergeResult<MergedTree> {
        let mut tree = MergedTree {
            snapshot: ours.clone(),
            ..MergedTree::default()
        };

        for (name, resolution) in &self.resolutions {
            match resolution {
                Resolution::KeepOurs => {}
                Resolution::TakeTheirs(blob) => {
                    tree.snapshot.insert(name.clone(), blob.clone());
                    tree.writes.insert(name.clone(), blob.clone());
                }
                Resolution::Delete => {
                    tree.snapshot.remove(name);
                    tree.deletes.push(name.clone());
                }
                Resolution::Conflict { ours, theirs } => {
                    let ours_content = ours.as_ref().map(|b| store.get_blob(&b.id)).transpose()?;
                    let theirs_content = theirs.as_ref().map(|b| store.get_blob(&b.id)).transpose()?;
                    let content = conflict_content(ours_content.as_deref(), theirs_content.as_deref());

                    let id = store.put_blob(&content)?;
                    let revision = ours
                        .iter()
                        .chain(theirs.iter())
                        .map(Blob::next_revision)
                        .max()
                        .unwrap_or(1);
                    let blob = Blob::new(id, name.as_str(), revision);
                    debug!(file = %name, "conflict");

                    tree.snapshot.insert(name.clone(), blob.clone());
                    tree.writes.insert(name.clone(), blob);
                    tree.conflicts.push(name.clone());
                }
            }
        }

        Ok(tree)
    }
}
