//! The working directory seen as a flat map of file names to contents.
//!
//! Names are relative, `/`-separated paths. The repository directory itself
//! is never listed.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{RepoError, RepoResult};
use crate::SPRIG_DIR;

/// File access needed by repository commands.
pub trait WorkingTree: Send + Sync {
    /// Contents of `name`, or `None` if there is no such file.
    fn read(&self, name: &str) -> RepoResult<Option<Vec<u8>>>;

    /// Create or overwrite `name`.
    fn write(&self, name: &str, data: &[u8]) -> RepoResult<()>;

    /// Delete `name`. Returns `false` if it did not exist.
    fn delete(&self, name: &str) -> RepoResult<bool>;

    /// Every regular file, sorted.
    fn list(&self) -> RepoResult<BTreeSet<String>>;

    /// Returns `true` if `name` matches an ignore pattern.
    fn is_ignored(&self, _name: &str) -> bool {
        false
    }
}

/// A working tree rooted at a directory on disk.
#[derive(Debug)]
pub struct FsWorkingTree {
    root: PathBuf,
    ignore: Option<Gitignore>,
}

impl FsWorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: None,
        }
    }

    /// Load gitignore-style patterns from `file`, relative to the root.
    /// A missing file means nothing is ignored.
    pub fn with_ignore_file(mut self, file: &str) -> RepoResult<Self> {
        let path = self.root.join(file);
        if !path.is_file() {
            self.ignore = None;
            return Ok(self);
        }
        let mut builder = GitignoreBuilder::new(&self.root);
        if let Some(e) = builder.add(&path) {
            return Err(RepoError::Config(format!("{}: {e}", path.display())));
        }
        let ignore = builder
            .build()
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        debug!(file = %path.display(), patterns = ignore.num_ignores(), "loaded ignore file");
        self.ignore = Some(ignore);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.root.clone(), |p, part| p.join(part))
    }

    fn name_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        Some(parts?.join("/"))
    }

    /// Remove now-empty directories between `path` and the root.
    fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }
}

impl WorkingTree for FsWorkingTree {
    fn read(&self, name: &str) -> RepoResult<Option<Vec<u8>>> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Ok(None);
        }
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> RepoResult<()> {
        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if path.is_dir() {
            // only an empty directory can be replaced by a file
            fs::remove_dir(&path)?;
        }
        fs::write(&path, data)?;
        debug!(file = name, bytes = data.len(), "wrote working file");
        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<bool> {
        let path = self.path_of(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = name, "deleted working file");
                self.prune_empty_parents(&path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> RepoResult<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == SPRIG_DIR));
        for entry in walker {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => RepoError::Io(io),
                None => RepoError::Io(io::Error::new(io::ErrorKind::Other, "filesystem loop")),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.name_of(entry.path()) {
                Some(name) => {
                    names.insert(name);
                }
                None => warn!(path = %entry.path().display(), "skipping non-UTF-8 path"),
            }
        }
        Ok(names)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore
            .as_ref()
            .is_some_and(|ig| ig.matched_path_or_any_parents(name, false).is_ignore())
    }
}

/// A working tree held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryWorkingTree {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryWorkingTree {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkingTree for InMemoryWorkingTree {
    fn read(&self, name: &str) -> RepoResult<Option<Vec<u8>>> {
        Ok(self.files.read().expect("lock poisoned").get(name).cloned())
    }

    fn write(&self, name: &str, data: &[u8]) -> RepoResult<()> {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> RepoResult<bool> {
        Ok(self.files.write().expect("lock poisoned").remove(name).is_some())
    }

    fn list(&self) -> RepoResult<BTreeSet<String>> {
        Ok(self.files.read().expect("lock poisoned").keys().cloned().collect())
    }
}
