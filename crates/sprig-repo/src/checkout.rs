//! Restoring files and switching the working tree between commits.

use std::collections::BTreeSet;

use tracing::{debug, info};

use sprig_dag::{Commit, Snapshot};
use sprig_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

impl Repository {
    /// Restore `name` from the current commit. The stage is not touched.
    pub fn checkout_file(&self, name: &str) -> RepoResult<()> {
        let state = self.load_state()?;
        let head = state.require_head()?;
        self.restore_file(head, name)
    }

    /// Restore `name` from the commit identified by `prefix`.
    pub fn checkout_commit_file(&self, prefix: &str, name: &str) -> RepoResult<()> {
        let state = self.load_state()?;
        let commit = state.graph.resolve_prefix(prefix)?;
        self.restore_file(commit, name)
    }

    fn restore_file(&self, commit: &Commit, name: &str) -> RepoResult<()> {
        let blob = commit
            .blob(name)
            .ok_or_else(|| RepoError::FileNotInCommit(name.to_string()))?;
        let data = self.store.get_blob(&blob.id)?;
        self.worktree.write(name, &data)?;
        info!(file = name, commit = %commit.id().short_hex(), "checkout file");
        Ok(())
    }

    /// Make `name` the current branch and its tip the working tree.
    pub fn checkout_branch(&self, name: &str) -> RepoResult<()> {
        let mut state = self.load_state()?;
        let mut stage = self.load_stage()?;
        if !state.refs.has_branch(name) {
            return Err(RepoError::BranchNotFound(name.to_string()));
        }
        if state.refs.current_branch() == name {
            return Err(RepoError::AlreadyOnBranch(name.to_string()));
        }

        let target = state.branch_tip(name)?.clone();
        let current = state.head()?.cloned();
        self.switch_tree(current.as_ref(), &target)?;

        state.refs.switch_to(name)?;
        stage.clear();
        self.save(&state, &stage)?;
        info!(branch = name, commit = %target.id().short_hex(), "checkout branch");
        Ok(())
    }

    /// Check out the commit identified by `prefix` and move the current
    /// branch to it.
    pub fn reset(&self, prefix: &str) -> RepoResult<Commit> {
        let mut state = self.load_state()?;
        let mut stage = self.load_stage()?;
        let target = state.graph.resolve_prefix(prefix)?.clone();
        let current = state.head()?.cloned();
        self.switch_tree(current.as_ref(), &target)?;

        state.refs.advance_current(target.id());
        stage.clear();
        self.save(&state, &stage)?;
        info!(
            branch = state.refs.current_branch(),
            commit = %target.id().short_hex(),
            "reset"
        );
        Ok(target)
    }

    /// Replace the files of `from` in the working tree with those of `to`.
    ///
    /// Fails without touching anything if a file `from` does not track
    /// would be overwritten with different content.
    pub(crate) fn switch_tree(&self, from: Option<&Commit>, to: &Commit) -> RepoResult<()> {
        let empty = Snapshot::new();
        let tracked = from.map_or(&empty, |c| c.snapshot());
        self.ensure_no_untracked_overwrite(
            tracked,
            to.snapshot().iter().map(|(name, blob)| (name.as_str(), Some(blob.id))),
        )?;

        let mut writes = Vec::with_capacity(to.snapshot().len());
        for (name, blob) in to.snapshot() {
            writes.push((name.as_str(), self.store.get_blob(&blob.id)?));
        }
        let deletes: Vec<&str> = tracked
            .keys()
            .map(String::as_str)
            .filter(|name| !to.tracks(name))
            .collect();
        self.apply_to_worktree(&writes, &deletes)?;
        debug!(
            from = ?from.map(|c| c.id().short_hex()),
            to = %to.id().short_hex(),
            files = to.snapshot().len(),
            "switched working tree"
        );
        Ok(())
    }

    /// Delete `deletes`, then write `writes`.
    ///
    /// Fails without touching anything if a file left after the deletes
    /// sits where a write needs a directory, or inside a directory a write
    /// needs as a file.
    pub(crate) fn apply_to_worktree(
        &self,
        writes: &[(&str, Vec<u8>)],
        deletes: &[&str],
    ) -> RepoResult<()> {
        let mut remaining = self.worktree.list()?;
        for name in deletes {
            remaining.remove(*name);
        }
        for (name, _) in writes {
            if let Some(blocker) = path_collision(&remaining, name) {
                return Err(RepoError::UntrackedFileConflict(blocker.to_string()));
            }
        }

        for name in deletes {
            self.worktree.delete(name)?;
        }
        for (name, data) in writes {
            self.worktree.write(name, data)?;
        }
        Ok(())
    }

    /// Check each incoming `(name, content id)` against the working tree.
    /// A `None` id stands for content not known in advance, which any
    /// untracked file would lose.
    pub(crate) fn ensure_no_untracked_overwrite<'a>(
        &self,
        tracked: &Snapshot,
        incoming: impl IntoIterator<Item = (&'a str, Option<ObjectId>)>,
    ) -> RepoResult<()> {
        let working = self.working_ids()?;
        for (name, id) in incoming {
            if tracked.contains_key(name) {
                continue;
            }
            match working.get(name) {
                Some(current) if Some(*current) != id => {
                    return Err(RepoError::UntrackedFileConflict(name.to_string()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A file in `files` that cannot coexist with a file at `name`: either one
/// of its parent directories, or something inside `name` as a directory.
fn path_collision<'a>(files: &'a BTreeSet<String>, name: &str) -> Option<&'a str> {
    for (end, _) in name.match_indices('/') {
        if let Some(parent) = files.get(&name[..end]) {
            return Some(parent);
        }
    }
    let dir = format!("{name}/");
    files
        .range(dir.clone()..)
        .next()
        .filter(|f| f.starts_with(&dir))
        .map(String::as_str)
}
