use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use sprig_crypto::ContentHasher;
use sprig_dag::{Commit, CommitBuilder};
use sprig_index::{validate_path, RemoveOutcome, Stage, StageChange, WorkdirStatus};
use sprig_store::{FsObjectStore, InMemoryObjectStore, ObjectStore};
use sprig_types::ObjectId;

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};
use crate::records::{FsRecordStore, InMemoryRecordStore, RecordStore};
use crate::state::RepoState;
use crate::worktree::{FsWorkingTree, InMemoryWorkingTree, WorkingTree};
use crate::{CONFIG_FILE, OBJECTS_DIR, SPRIG_DIR};

/// Branch listing and file status, as shown by `status`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub current_branch: String,
    /// Every branch name, sorted.
    pub branches: Vec<String>,
    pub files: WorkdirStatus,
}

/// A sprig repository: object store, state records and working tree.
///
/// Every command loads the state and stage records, checks its
/// preconditions, then mutates and saves. A command that fails a
/// precondition leaves the records and the working tree untouched.
pub struct Repository {
    pub(crate) store: Box<dyn ObjectStore>,
    pub(crate) records: Box<dyn RecordStore>,
    pub(crate) worktree: Box<dyn WorkingTree>,
    pub(crate) config: RepoConfig,
    pub(crate) root: Option<PathBuf>,
}

impl Repository {
    /// Create a repository in `root/.sprig` with default configuration.
    pub fn init(root: impl AsRef<Path>) -> RepoResult<Self> {
        Self::init_with_config(root, RepoConfig::default())
    }

    pub fn init_with_config(root: impl AsRef<Path>, config: RepoConfig) -> RepoResult<Self> {
        let root = root.as_ref();
        let dir = root.join(SPRIG_DIR);
        if dir.exists() {
            return Err(RepoError::AlreadyInitialized);
        }
        fs::create_dir_all(&dir)?;
        config.save(&dir.join(CONFIG_FILE))?;

        let repo = Self::on_disk(root, config)?;
        repo.initialize()?;
        info!(root = %root.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository whose working tree is `root`.
    pub fn open(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref();
        let dir = root.join(SPRIG_DIR);
        if !dir.is_dir() {
            return Err(RepoError::NotInitialized);
        }
        let config = RepoConfig::load(&dir.join(CONFIG_FILE))?;
        let repo = Self::on_disk(root, config)?;
        if repo.records.load_state()?.is_none() {
            return Err(RepoError::NotInitialized);
        }
        Ok(repo)
    }

    /// Open the repository containing `start` or one of its parents.
    pub fn discover(start: impl AsRef<Path>) -> RepoResult<Self> {
        let found = start
            .as_ref()
            .ancestors()
            .find(|dir| dir.join(SPRIG_DIR).is_dir())
            .ok_or(RepoError::NotInitialized)?;
        debug!(root = %found.display(), "discovered repository");
        Self::open(found)
    }

    fn on_disk(root: &Path, config: RepoConfig) -> RepoResult<Self> {
        let dir = root.join(SPRIG_DIR);
        let store = FsObjectStore::open(dir.join(OBJECTS_DIR))?;
        let worktree = FsWorkingTree::new(root).with_ignore_file(&config.worktree.ignore_file)?;
        Ok(Self {
            store: Box::new(store),
            records: Box::new(FsRecordStore::new(dir)),
            worktree: Box::new(worktree),
            config,
            root: Some(root.to_path_buf()),
        })
    }

    /// An initialized repository held entirely in memory.
    pub fn in_memory() -> RepoResult<Self> {
        Self::in_memory_with_config(RepoConfig::default())
    }

    pub fn in_memory_with_config(config: RepoConfig) -> RepoResult<Self> {
        let repo = Self::with_parts(
            Box::new(InMemoryObjectStore::new()),
            Box::new(InMemoryRecordStore::new()),
            Box::new(InMemoryWorkingTree::new()),
            config,
        );
        repo.initialize()?;
        Ok(repo)
    }

    /// Assemble a repository from its collaborators. Call
    /// [`initialize`](Self::initialize) if the records are fresh.
    pub fn with_parts(
        store: Box<dyn ObjectStore>,
        records: Box<dyn RecordStore>,
        worktree: Box<dyn WorkingTree>,
        config: RepoConfig,
    ) -> Self {
        Self {
            store,
            records,
            worktree,
            config,
            root: None,
        }
    }

    /// Write the empty state and stage records.
    pub fn initialize(&self) -> RepoResult<()> {
        if self.records.load_state()?.is_some() {
            return Err(RepoError::AlreadyInitialized);
        }
        self.records
            .save_state(&RepoState::new(&self.config.default_branch)?)?;
        self.records.save_stage(&Stage::new())?;
        Ok(())
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Working-tree root, `None` for repositories not on disk.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn worktree(&self) -> &dyn WorkingTree {
        self.worktree.as_ref()
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    // ---------------------------------------------------------------
    // Record plumbing
    // ---------------------------------------------------------------

    pub(crate) fn load_state(&self) -> RepoResult<RepoState> {
        let state = self.records.load_state()?.ok_or(RepoError::NotInitialized)?;
        state.validate()?;
        Ok(state)
    }

    pub(crate) fn load_stage(&self) -> RepoResult<Stage> {
        self.records.load_stage()
    }

    pub(crate) fn save(&self, state: &RepoState, stage: &Stage) -> RepoResult<()> {
        self.records.save_state(state)?;
        self.records.save_stage(stage)
    }

    /// Persist `commit`, add it to the graph and move the current branch to it.
    pub(crate) fn record_commit(&self, state: &mut RepoState, commit: Commit) -> RepoResult<ObjectId> {
        let id = self.store.write(&commit.to_stored_object()?)?;
        state.graph.insert(commit)?;
        state.refs.advance_current(id);
        Ok(id)
    }

    /// Content id of every file in the working tree.
    pub(crate) fn working_ids(&self) -> RepoResult<BTreeMap<String, ObjectId>> {
        let mut ids = BTreeMap::new();
        for name in self.worktree.list()? {
            if let Some(data) = self.worktree.read(&name)? {
                ids.insert(name, ContentHasher::BLOB.hash(&data));
            }
        }
        Ok(ids)
    }

    // ---------------------------------------------------------------
    // Staging and committing
    // ---------------------------------------------------------------

    /// Stage the working copy of `name`.
    pub fn add(&self, name: &str) -> RepoResult<StageChange> {
        let state = self.load_state()?;
        let mut stage = self.load_stage()?;
        validate_path(name)?;
        let content = self
            .worktree
            .read(name)?
            .ok_or_else(|| RepoError::FileNotFound(name.to_string()))?;

        let committed = state.head()?.and_then(|c| c.blob(name));
        let change = stage.stage_add(name, &content, committed, self.store.as_ref())?;
        self.records.save_stage(&stage)?;
        info!(file = name, staged = matches!(change, StageChange::Staged(_)), "add");
        Ok(change)
    }

    /// Unstage `name`, or stage its removal and delete the working copy if
    /// the current commit tracks it.
    pub fn remove(&self, name: &str) -> RepoResult<RemoveOutcome> {
        let state = self.load_state()?;
        let mut stage = self.load_stage()?;
        let tracked = state.head()?.is_some_and(|c| c.tracks(name));

        let outcome = stage.stage_remove(name, tracked)?;
        if outcome == RemoveOutcome::MarkedRemoved {
            self.worktree.delete(name)?;
        }
        self.records.save_stage(&stage)?;
        info!(file = name, ?outcome, "rm");
        Ok(outcome)
    }

    /// Commit the stage on top of the current branch.
    ///
    /// The first commit of a repository creates the current branch.
    pub fn commit(&self, message: &str) -> RepoResult<Commit> {
        let mut state = self.load_state()?;
        let mut stage = self.load_stage()?;
        if message.trim().is_empty() {
            return Err(RepoError::EmptyMessage);
        }
        if stage.is_empty() {
            return Err(RepoError::NothingToCommit);
        }

        let builder = match state.head()? {
            Some(parent) => CommitBuilder::on_top_of(parent),
            None => CommitBuilder::new(),
        };
        let mut snapshot = builder.snapshot().clone();
        stage.apply_to(&mut snapshot);
        let commit = builder.with_snapshot(snapshot).finish(message, Utc::now())?;

        let id = self.record_commit(&mut state, commit.clone())?;
        stage.clear();
        self.save(&state, &stage)?;
        info!(
            commit = %id.short_hex(),
            branch = state.refs.current_branch(),
            files = commit.snapshot().len(),
            "commit"
        );
        Ok(commit)
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    /// Tip of the current branch, `None` before the first commit.
    pub fn head(&self) -> RepoResult<Option<Commit>> {
        Ok(self.load_state()?.head()?.cloned())
    }

    pub fn current_branch(&self) -> RepoResult<String> {
        Ok(self.load_state()?.refs.current_branch().to_string())
    }

    /// First-parent history of the current branch, newest first.
    pub fn log(&self) -> RepoResult<Vec<Commit>> {
        let state = self.load_state()?;
        let head = state.require_head()?;
        Ok(state.graph.log(head.id()).cloned().collect())
    }

    /// Every commit in the repository, newest first.
    pub fn global_log(&self) -> RepoResult<Vec<Commit>> {
        let state = self.load_state()?;
        let mut commits: Vec<Commit> = state.graph.iter().cloned().collect();
        commits.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()).then(a.id().cmp(&b.id())));
        Ok(commits)
    }

    /// Commits whose message is exactly `message`. May be empty.
    pub fn find(&self, message: &str) -> RepoResult<Vec<Commit>> {
        let state = self.load_state()?;
        Ok(state
            .graph
            .find_by_message(message)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Resolve a full or abbreviated commit id.
    pub fn resolve(&self, prefix: &str) -> RepoResult<Commit> {
        let state = self.load_state()?;
        Ok(state.graph.resolve_prefix(prefix)?.clone())
    }

    // ---------------------------------------------------------------
    // Branches
    // ---------------------------------------------------------------

    /// Create `name` at the current commit.
    pub fn branch(&self, name: &str) -> RepoResult<()> {
        let mut state = self.load_state()?;
        let head = state.require_head()?.id();
        state.refs.create_branch(name, head)?;
        self.records.save_state(&state)?;
        info!(branch = name, at = %head.short_hex(), "branch");
        Ok(())
    }

    /// Delete the branch pointer `name`. Its commits stay in the graph.
    pub fn remove_branch(&self, name: &str) -> RepoResult<()> {
        let mut state = self.load_state()?;
        let tip = state.refs.delete_branch(name)?;
        self.records.save_state(&state)?;
        info!(branch = name, was = %tip.short_hex(), "rm-branch");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------

    pub fn status(&self) -> RepoResult<StatusReport> {
        let state = self.load_state()?;
        let stage = self.load_stage()?;
        let empty = BTreeMap::new();
        let tracked = match state.head()? {
            Some(head) => head.snapshot(),
            None => &empty,
        };

        let mut files = WorkdirStatus::compute(tracked, &stage, &self.working_ids()?);
        files.retain_untracked(|name| !self.worktree.is_ignored(name));

        Ok(StatusReport {
            current_branch: state.refs.current_branch().to_string(),
            branches: state.refs.branches().map(|(name, _)| name.to_string()).collect(),
            files,
        })
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sprig_index::FileStatus;

    pub(crate) fn write(repo: &Repository, name: &str, content: &str) {
        repo.worktree().write(name, content.as_bytes()).unwrap();
    }

    pub(crate) fn read(repo: &Repository, name: &str) -> Option<String> {
        repo.worktree()
            .read(name)
            .unwrap()
            .map(|data| String::from_utf8(data).unwrap())
    }

    /// Write, add and commit each file.
    pub(crate) fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> Commit {
        for (name, content) in files {
            write(repo, name, content);
            repo.add(name).unwrap();
        }
        repo.commit(message).unwrap()
    }

    #[test]
    fn in_memory_starts_empty() {
        let repo = Repository::in_memory().unwrap();
        assert!(repo.head().unwrap().is_none());
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert!(matches!(repo.log(), Err(RepoError::NoCommits)));
        assert!(matches!(repo.initialize(), Err(RepoError::AlreadyInitialized)));
    }

    #[test]
    fn linear_history() {
        let repo = Repository::in_memory().unwrap();
        let c1 = commit_files(&repo, &[("f", "1")], "c1");
        let c2 = commit_files(&repo, &[("f", "2")], "c2");

        let messages: Vec<String> = repo.log().unwrap().iter().map(|c| c.message().to_string()).collect();
        assert_eq!(messages, vec!["c2", "c1"]);
        assert_eq!(c2.parent(), Some(c1.id()));
        assert_eq!(c2.blob("f").unwrap().revision, 2);
        assert_eq!(repo.head().unwrap().unwrap().id(), c2.id());
    }

    #[test]
    fn commit_preconditions() {
        let repo = Repository::in_memory().unwrap();
        assert!(matches!(repo.commit("nothing"), Err(RepoError::NothingToCommit)));
        write(&repo, "f", "x");
        repo.add("f").unwrap();
        assert!(matches!(repo.commit(""), Err(RepoError::EmptyMessage)));
        assert!(matches!(repo.commit("  "), Err(RepoError::EmptyMessage)));
        // the stage survives a rejected commit
        assert!(repo.commit("ok").is_ok());
    }

    #[test]
    fn add_missing_file() {
        let repo = Repository::in_memory().unwrap();
        assert!(matches!(repo.add("ghost"), Err(RepoError::FileNotFound(_))));
        assert!(matches!(repo.add("../escape"), Err(RepoError::InvalidName(_))));
    }

    #[test]
    fn re_adding_committed_content_unstages() {
        let repo = Repository::in_memory().unwrap();
        commit_files(&repo, &[("f", "1")], "c1");
        write(&repo, "f", "2");
        repo.add("f").unwrap();
        write(&repo, "f", "1");
        assert_eq!(repo.add("f").unwrap(), StageChange::Unchanged);
        assert!(matches!(repo.commit("noop"), Err(RepoError::NothingToCommit)));
    }

    #[test]
    fn remove_tracked_file() {
        let repo = Repository::in_memory().unwrap();
        commit_files(&repo, &[("f", "1"), ("g", "g")], "c1");

        assert_eq!(repo.remove("f").unwrap(), RemoveOutcome::MarkedRemoved);
        assert!(read(&repo, "f").is_none());
        let c2 = repo.commit("drop f").unwrap();
        assert!(!c2.tracks("f"));
        assert!(c2.tracks("g"));
    }

    #[test]
    fn remove_staged_only_file_keeps_it() {
        let repo = Repository::in_memory().unwrap();
        write(&repo, "new", "n");
        repo.add("new").unwrap();
        assert_eq!(repo.remove("new").unwrap(), RemoveOutcome::Unstaged);
        assert_eq!(read(&repo, "new").as_deref(), Some("n"));
        assert!(matches!(repo.remove("new"), Err(RepoError::NothingToRemove(_))));
    }

    #[test]
    fn find_and_global_log() {
        let repo = Repository::in_memory().unwrap();
        let a = commit_files(&repo, &[("f", "1")], "same");
        let b = commit_files(&repo, &[("f", "2")], "other");
        let c = commit_files(&repo, &[("f", "3")], "same");

        let found: Vec<ObjectId> = repo.find("same").unwrap().iter().map(Commit::id).collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&a.id()) && found.contains(&c.id()));
        assert!(repo.find("missing").unwrap().is_empty());

        let all = repo.global_log().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|x| x.id() == b.id()));
    }

    #[test]
    fn branches() {
        let repo = Repository::in_memory().unwrap();
        assert!(matches!(repo.branch("dev"), Err(RepoError::NoCommits)));
        commit_files(&repo, &[("f", "1")], "c1");
        repo.branch("dev").unwrap();
        assert!(matches!(repo.branch("dev"), Err(RepoError::BranchExists(_))));
        assert!(matches!(
            repo.remove_branch("main"),
            Err(RepoError::CannotRemoveCurrentBranch(_))
        ));
        repo.remove_branch("dev").unwrap();
        assert!(matches!(repo.remove_branch("dev"), Err(RepoError::BranchNotFound(_))));
        assert_eq!(repo.status().unwrap().branches, vec!["main"]);
    }

    #[test]
    fn status_sections() {
        let repo = Repository::in_memory().unwrap();
        commit_files(&repo, &[("kept", "k"), ("gone", "g"), ("edited", "e"), ("dropped", "d")], "c1");

        write(&repo, "staged", "s");
        repo.add("staged").unwrap();
        repo.remove("dropped").unwrap();
        repo.worktree().delete("gone").unwrap();
        write(&repo, "edited", "changed");
        write(&repo, "loose", "l");

        let status = repo.status().unwrap();
        assert_eq!(status.current_branch, "main");
        assert_eq!(status.files.staged, vec!["staged"]);
        assert_eq!(status.files.removed, vec!["dropped"]);
        let unstaged: Vec<(&str, FileStatus)> = status
            .files
            .unstaged
            .iter()
            .map(|e| (e.path.as_str(), e.status))
            .collect();
        assert_eq!(
            unstaged,
            vec![("edited", FileStatus::Modified), ("gone", FileStatus::Deleted)]
        );
        assert_eq!(status.files.untracked, vec!["loose"]);
    }

    #[test]
    fn on_disk_init_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(dir.path().join(SPRIG_DIR).join(CONFIG_FILE).is_file());
        commit_files(&repo, &[("a.txt", "hello"), ("docs/b.md", "# b")], "first");
        assert!(matches!(Repository::init(dir.path()), Err(RepoError::AlreadyInitialized)));

        let reopened = Repository::open(dir.path()).unwrap();
        let log = reopened.log().unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].tracks("docs/b.md"));
        assert!(reopened.status().unwrap().files.is_clean());
    }

    #[test]
    fn open_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Repository::open(dir.path()), Err(RepoError::NotInitialized)));
    }

    #[test]
    fn discover_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(repo.root(), Some(dir.path()));
    }

    #[test]
    fn ignored_files_are_not_untracked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".sprigignore"), "*.log\n").unwrap();
        Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("run.log"), "noise").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let untracked = repo.status().unwrap().files.untracked;
        assert_eq!(untracked, vec![".sprigignore", "notes.txt"]);
    }
}
