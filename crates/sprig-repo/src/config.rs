//! Repository configuration, stored as `.sprig/config.toml`.
//!
//! ```toml
//! default_branch = "main"
//!
//! [merge]
//! ancestor = "lineage"   # or "first-parent"
//!
//! [worktree]
//! ignore_file = ".sprigignore"
//! ```
//!
//! Every key is optional; a missing file means all defaults.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sprig_dag::AncestorStrategy;

use crate::error::{RepoError, RepoResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Branch created by the first commit.
    pub default_branch: String,
    pub merge: MergeConfig,
    pub worktree: WorktreeConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// How the split point of two branches is found.
    pub ancestor: AncestorStrategy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    /// Gitignore-style pattern file, relative to the working-tree root.
    /// Matching files are left out of the untracked listing.
    pub ignore_file: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            merge: MergeConfig::default(),
            worktree: WorktreeConfig::default(),
        }
    }
}

impl Default for WorktreeConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".sprigignore".to_string(),
        }
    }
}

impl RepoConfig {
    pub fn from_toml(text: &str) -> RepoResult<Self> {
        toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> RepoResult<String> {
        toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))
    }

    /// Load from `path`, falling back to defaults if the file is absent.
    pub fn load(path: &Path) -> RepoResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
