//! Persistence of the state and stage records.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use sprig_index::Stage;

use crate::error::{RepoError, RepoResult};
use crate::state::RepoState;

pub const STATE_FILE: &str = "state";
pub const STAGE_FILE: &str = "stage";

/// Load and save the two mutable records of a repository.
///
/// Objects live in an [`ObjectStore`](sprig_store::ObjectStore); everything
/// else a command changes goes through this trait.
pub trait RecordStore: Send + Sync {
    /// `None` if the repository was never initialized.
    fn load_state(&self) -> RepoResult<Option<RepoState>>;

    fn save_state(&self, state: &RepoState) -> RepoResult<()>;

    /// A missing stage record reads as an empty stage.
    fn load_stage(&self) -> RepoResult<Stage>;

    fn save_stage(&self, stage: &Stage) -> RepoResult<()>;
}

fn encode_stage(stage: &Stage) -> RepoResult<Vec<u8>> {
    bincode::serialize(stage).map_err(|e| RepoError::CorruptRecord {
        record: "stage",
        reason: e.to_string(),
    })
}

fn decode_stage(data: &[u8]) -> RepoResult<Stage> {
    bincode::deserialize(data).map_err(|e| RepoError::CorruptRecord {
        record: "stage",
        reason: e.to_string(),
    })
}

/// Records as files in the repository directory.
#[derive(Clone, Debug)]
pub struct FsRecordStore {
    dir: PathBuf,
}

impl FsRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(&self, file: &str) -> RepoResult<Option<Vec<u8>>> {
        match fs::read(self.dir.join(file)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, file: &str, data: &[u8]) -> RepoResult<()> {
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp.write_all(data)?;
        temp.flush()?;
        temp.persist(self.dir.join(file)).map_err(|e| e.error)?;
        debug!(record = file, bytes = data.len(), "saved record");
        Ok(())
    }
}

impl RecordStore for FsRecordStore {
    fn load_state(&self) -> RepoResult<Option<RepoState>> {
        self.read_optional(STATE_FILE)?
            .map(|data| RepoState::from_bytes(&data))
            .transpose()
    }

    fn save_state(&self, state: &RepoState) -> RepoResult<()> {
        self.write_atomic(STATE_FILE, &state.to_bytes()?)
    }

    fn load_stage(&self) -> RepoResult<Stage> {
        match self.read_optional(STAGE_FILE)? {
            Some(data) => decode_stage(&data),
            None => {
                warn!(dir = %self.dir.display(), "stage record missing, treating as empty");
                Ok(Stage::new())
            }
        }
    }

    fn save_stage(&self, stage: &Stage) -> RepoResult<()> {
        self.write_atomic(STAGE_FILE, &encode_stage(stage)?)
    }
}

/// Records held in memory, encoded the same way as on disk.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    state: RwLock<Option<Vec<u8>>>,
    stage: RwLock<Option<Vec<u8>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_state(&self) -> RepoResult<Option<RepoState>> {
        let state = self.state.read().expect("lock poisoned");
        state.as_deref().map(RepoState::from_bytes).transpose()
    }

    fn save_state(&self, state: &RepoState) -> RepoResult<()> {
        let bytes = state.to_bytes()?;
        *self.state.write().expect("lock poisoned") = Some(bytes);
        Ok(())
    }

    fn load_stage(&self) -> RepoResult<Stage> {
        let stage = self.stage.read().expect("lock poisoned");
        match stage.as_deref() {
            Some(data) => decode_stage(data),
            None => Ok(Stage::new()),
        }
    }

    fn save_stage(&self, stage: &Stage) -> RepoResult<()> {
        let bytes = encode_stage(stage)?;
        *self.stage.write().expect("lock poisoned") = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_store::InMemoryObjectStore;

    fn sample_stage() -> Stage {
        let store = InMemoryObjectStore::new();
        let mut stage = Stage::new();
        stage.stage_add("a.txt", b"hello", None, &store).unwrap();
        stage
    }

    #[test]
    fn fs_state_absent_until_saved() {
        let dir = tempfile::tempdir().unwrap();
        let records = FsRecordStore::new(dir.path());
        assert!(records.load_state().unwrap().is_none());

        let state = RepoState::new("main").unwrap();
        records.save_state(&state).unwrap();
        assert_eq!(records.load_state().unwrap(), Some(state));
    }

    #[test]
    fn fs_missing_stage_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = FsRecordStore::new(dir.path());
        assert!(records.load_stage().unwrap().is_empty());
    }

    #[test]
    fn fs_stage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let records = FsRecordStore::new(dir.path());
        let stage = sample_stage();
        records.save_stage(&stage).unwrap();
        assert_eq!(records.load_stage().unwrap(), stage);
        assert!(dir.path().join(STAGE_FILE).is_file());
    }

    #[test]
    fn fs_corrupt_state_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), b"\xff").unwrap();
        let err = FsRecordStore::new(dir.path()).load_state().unwrap_err();
        assert!(!err.is_precondition());
    }

    #[test]
    fn memory_round_trip() {
        let records = InMemoryRecordStore::new();
        assert!(records.load_state().unwrap().is_none());
        assert!(records.load_stage().unwrap().is_empty());

        let stage = sample_stage();
        records.save_stage(&stage).unwrap();
        records.save_state(&RepoState::new("trunk").unwrap()).unwrap();

        assert_eq!(records.load_stage().unwrap(), stage);
        let state = records.load_state().unwrap().unwrap();
        assert_eq!(state.refs.current_branch(), "trunk");
    }
}
