//! Merging another branch into the current one.

use chrono::Utc;
use tracing::{info, warn};

use sprig_dag::{Commit, CommitBuilder, Snapshot};
use sprig_index::Stage;
use sprig_merge::{reconcile, Resolution};
use sprig_types::ObjectId;

use crate::error::{MergeBlock, RepoError, RepoResult};
use crate::repository::Repository;
use crate::state::RepoState;

/// What a merge did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The given branch is already an ancestor of the current one.
    AlreadyUpToDate,
    /// The current branch was moved to the given branch's tip.
    FastForward { to: ObjectId },
    /// A merge commit was created. `conflicts` lists the files left with
    /// conflict markers.
    Merged { commit: Commit, conflicts: Vec<String> },
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, Self::Merged { conflicts, .. } if !conflicts.is_empty())
    }
}

impl Repository {
    /// Merge `branch` into the current branch.
    pub fn merge(&self, branch: &str) -> RepoResult<MergeOutcome> {
        let mut state = self.load_state()?;
        let mut stage = self.load_stage()?;
        self.merge_loaded(&mut state, &mut stage, branch)
    }

    fn merge_loaded(
        &self,
        state: &mut RepoState,
        stage: &mut Stage,
        branch: &str,
    ) -> RepoResult<MergeOutcome> {
        if !stage.is_empty() {
            return Err(RepoError::MergeBlocked(MergeBlock::UncommittedChanges));
        }
        if !state.refs.has_branch(branch) {
            return Err(RepoError::BranchNotFound(branch.to_string()));
        }
        if state.refs.current_branch() == branch {
            return Err(RepoError::MergeBlocked(MergeBlock::SelfMerge));
        }

        let theirs = state.branch_tip(branch)?.clone();
        let Some(ours) = state.head()?.cloned() else {
            return self.fast_forward(state, stage, None, branch, theirs);
        };
        let base = state
            .graph
            .common_ancestor(&ours.id(), &theirs.id(), self.config.merge.ancestor)
            .cloned();
        let base_id = base.as_ref().map(Commit::id);

        if base_id == Some(theirs.id()) {
            info!(branch, "given branch is an ancestor of the current branch");
            return Ok(MergeOutcome::AlreadyUpToDate);
        }
        if base_id == Some(ours.id()) {
            return self.fast_forward(state, stage, Some(&ours), branch, theirs);
        }

        let empty = Snapshot::new();
        let base_snapshot = base.as_ref().map_or(&empty, |c| c.snapshot());
        let plan = reconcile(ours.snapshot(), theirs.snapshot(), base_snapshot);

        let incoming = plan.written_paths().map(|name| {
            let id = match plan.resolution(name) {
                Some(Resolution::TakeTheirs(blob)) => Some(blob.id),
                _ => None,
            };
            (name, id)
        });
        self.ensure_no_untracked_overwrite(ours.snapshot(), incoming)
            .map_err(untracked_blocks_merge)?;

        let tree = plan.materialize(ours.snapshot(), self.store.as_ref())?;
        let mut writes = Vec::with_capacity(tree.writes.len());
        for (name, blob) in &tree.writes {
            writes.push((name.as_str(), self.store.get_blob(&blob.id)?));
        }
        let deletes: Vec<&str> = tree.deletes.iter().map(String::as_str).collect();
        self.apply_to_worktree(&writes, &deletes)
            .map_err(untracked_blocks_merge)?;

        let message = format!("Merged {branch} into {}.", state.refs.current_branch());
        let commit = CommitBuilder::on_top_of(&ours)
            .with_second_parent(theirs.id())
            .with_snapshot(tree.snapshot)
            .finish(message, Utc::now())?;
        let id = self.record_commit(state, commit.clone())?;
        stage.clear();
        self.save(state, stage)?;

        if tree.conflicts.is_empty() {
            info!(branch, commit = %id.short_hex(), "merged");
        } else {
            warn!(
                branch,
                commit = %id.short_hex(),
                conflicts = tree.conflicts.len(),
                "merged with conflicts"
            );
        }
        Ok(MergeOutcome::Merged {
            commit,
            conflicts: tree.conflicts,
        })
    }

    /// Move the current branch to `theirs`. With no current commit the
    /// working tree only gains files.
    fn fast_forward(
        &self,
        state: &mut RepoState,
        stage: &mut Stage,
        ours: Option<&Commit>,
        branch: &str,
        theirs: Commit,
    ) -> RepoResult<MergeOutcome> {
        self.switch_tree(ours, &theirs)
            .map_err(untracked_blocks_merge)?;
        state.refs.advance_current(theirs.id());
        stage.clear();
        self.save(state, stage)?;
        info!(branch, to = %theirs.id().short_hex(), "fast-forward");
        Ok(MergeOutcome::FastForward { to: theirs.id() })
    }
}

fn untracked_blocks_merge(err: RepoError) -> RepoError {
    match err {
        RepoError::UntrackedFileConflict(_) => RepoError::MergeBlocked(MergeBlock::UntrackedFile),
        other => other,
    }
}
