//! Remotes: other sprig repositories reachable through the filesystem.
//!
//! A remote is registered by the path of its `.sprig` directory. Fetch
//! copies a remote branch's ancestry into the local store and records it
//! under a `<remote>/<branch>` tracking branch; push copies the current
//! branch's ancestry out and advances the remote branch, fast-forward only.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use sprig_refs::tracking_branch_name;
use sprig_store::FsObjectStore;
use sprig_sync::{ensure_fast_forward, Endpoint, FetchResult, PushResult, RefUpdate, Transfer};

use crate::error::{MergeBlock, RepoError, RepoResult};
use crate::merge::MergeOutcome;
use crate::records::{FsRecordStore, RecordStore};
use crate::repository::Repository;
use crate::state::RepoState;
use crate::OBJECTS_DIR;

/// Result of `pull`: the fetch, then the merge of the tracking branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullResult {
    pub fetch: FetchResult,
    pub merge: MergeOutcome,
}

/// An opened remote repository.
struct Remote {
    store: FsObjectStore,
    records: FsRecordStore,
    state: RepoState,
}

impl Remote {
    fn open(dir: &Path) -> RepoResult<Self> {
        let unreachable = || RepoError::RemoteUnreachable(dir.display().to_string());
        let objects = dir.join(OBJECTS_DIR);
        if !dir.is_dir() || !objects.is_dir() {
            return Err(unreachable());
        }
        let records = FsRecordStore::new(dir);
        let state = records.load_state()?.ok_or_else(unreachable)?;
        state.validate()?;
        let store = FsObjectStore::open(objects)?;
        debug!(dir = %dir.display(), commits = state.graph.len(), "opened remote");
        Ok(Self {
            store,
            records,
            state,
        })
    }

    fn endpoint(&self) -> Endpoint<'_> {
        Endpoint {
            graph: &self.state.graph,
            store: &self.store,
        }
    }
}

impl Repository {
    /// Register `path` (a remote `.sprig` directory) as `name`. Relative
    /// paths are resolved against the working-tree root when used.
    pub fn add_remote(&self, name: &str, path: impl Into<PathBuf>) -> RepoResult<()> {
        let mut state = self.load_state()?;
        let path = path.into();
        state.refs.add_remote(name, path.clone())?;
        self.records.save_state(&state)?;
        info!(remote = name, path = %path.display(), "add-remote");
        Ok(())
    }

    pub fn remove_remote(&self, name: &str) -> RepoResult<()> {
        let mut state = self.load_state()?;
        state.refs.remove_remote(name)?;
        self.records.save_state(&state)?;
        info!(remote = name, "rm-remote");
        Ok(())
    }

    /// Registered remotes and their paths, sorted by name.
    pub fn remotes(&self) -> RepoResult<Vec<(String, PathBuf)>> {
        let state = self.load_state()?;
        Ok(state
            .refs
            .remotes()
            .map(|(name, path)| (name.to_string(), path.to_path_buf()))
            .collect())
    }

    fn open_remote(&self, state: &RepoState, name: &str) -> RepoResult<Remote> {
        let path = state.refs.remote(name)?;
        let dir = match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        Remote::open(&dir)
    }

    /// Copy `branch` of `remote` and its ancestry into this repository and
    /// point `<remote>/<branch>` at it.
    pub fn fetch(&self, remote: &str, branch: &str) -> RepoResult<FetchResult> {
        let mut state = self.load_state()?;
        let source = self.open_remote(&state, remote)?;
        let tip = source
            .state
            .refs
            .branch(branch)
            .ok_or_else(|| RepoError::RemoteBranchNotFound(format!("{remote}/{branch}")))?;

        let transfer = Transfer::copy(
            source.endpoint(),
            &tip,
            &mut state.graph,
            self.store.as_ref(),
            &state.known_ids,
        )?;
        state.known_ids.extend(transfer.commits.iter().copied());

        let tracking = tracking_branch_name(remote, branch);
        let old = state.refs.branch(&tracking);
        state.refs.set_branch(&tracking, tip)?;
        self.records.save_state(&state)?;
        info!(
            branch = %tracking,
            tip = %tip.short_hex(),
            commits = transfer.commits.len(),
            "fetch"
        );

        Ok(FetchResult {
            transfer,
            updated: RefUpdate {
                name: tracking,
                old,
                new: tip,
            },
        })
    }

    /// Copy the current branch's ancestry to `remote` and move its `branch`
    /// to the current commit. The remote branch must be an ancestor of the
    /// current commit; a branch the remote lacks is created. The remote's
    /// working tree is not updated.
    pub fn push(&self, remote: &str, branch: &str) -> RepoResult<PushResult> {
        let state = self.load_state()?;
        let head = state.require_head()?.id();
        let mut dest = self.open_remote(&state, remote)?;
        let old = dest.state.refs.branch(branch);
        ensure_fast_forward(&state.graph, branch, old.as_ref(), &head)?;

        let source = Endpoint {
            graph: &state.graph,
            store: self.store.as_ref(),
        };
        let transfer = Transfer::copy(
            source,
            &head,
            &mut dest.state.graph,
            &dest.store,
            &BTreeSet::new(),
        )?;
        dest.state.refs.set_branch(branch, head)?;
        dest.records.save_state(&dest.state)?;
        info!(
            remote,
            branch,
            tip = %head.short_hex(),
            commits = transfer.commits.len(),
            "push"
        );

        Ok(PushResult {
            transfer,
            updated: RefUpdate {
                name: branch.to_string(),
                old,
                new: head,
            },
        })
    }

    /// Fetch `branch` from `remote`, then merge the tracking branch.
    pub fn pull(&self, remote: &str, branch: &str) -> RepoResult<PullResult> {
        if !self.load_stage()?.is_empty() {
            return Err(RepoError::MergeBlocked(MergeBlock::UncommittedChanges));
        }
        let fetch = self.fetch(remote, branch)?;
        let merge = self.merge(&fetch.updated.name)?;
        Ok(PullResult { fetch, merge })
    }
}
