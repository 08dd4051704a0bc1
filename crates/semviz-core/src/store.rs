//! File-backed persistence.
//!
//! The state lives in a single JSON file. Saves go through a temp file in
//! the same directory and an atomic rename, so a crash mid-write leaves the
//! previous state intact. A file that cannot be decoded is not an error on
//! load: the project starts fresh and the reason is logged.

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::ledger::DEFAULT_RETENTION;
use crate::project::Project;
use crate::snapshot::{Snapshot, SnapshotError};

/// Errors from reading or writing the state file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("state file {path}: {source}")]
    Io {
        /// File involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// State could not be encoded.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Where a loaded project came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// No state file yet.
    Fresh,
    /// Decoded from the state file.
    Restored,
    /// The state file was unreadable; defaults were used.
    Recovered {
        /// What went wrong.
        reason: String,
    },
}

/// Result of [`StateStore::load`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// The project.
    pub project: Project,
    /// Where it came from.
    pub origin: LoadOrigin,
}

/// JSON state file at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: Utf8PathBuf,
    retention: usize,
}

impl StateStore {
    /// Store at `path` with the default history retention.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Override the history retention applied on load.
    #[must_use]
    pub const fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    /// The state file path.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Whether the state file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the project.
    ///
    /// Only a failure to read an existing file is an error. Missing files
    /// give a fresh project; corrupt or inconsistent ones are logged and
    /// replaced by defaults.
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn load(&self) -> StoreResult<LoadOutcome> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no state file, starting fresh");
                return Ok(self.fresh(LoadOrigin::Fresh));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let restored =
            Snapshot::from_json(&raw).and_then(|s| Project::restore(s, self.retention));
        match restored {
            Ok(project) => {
                debug!(
                    version = %project.current_version(),
                    commits = project.ledger().len(),
                    "state restored"
                );
                Ok(LoadOutcome {
                    project,
                    origin: LoadOrigin::Restored,
                })
            }
            Err(e) => {
                warn!(error = %e, "state file unreadable, starting fresh");
                Ok(self.fresh(LoadOrigin::Recovered {
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn fresh(&self, origin: LoadOrigin) -> LoadOutcome {
        LoadOutcome {
            project: Project::new(self.retention),
            origin,
        }
    }

    /// Persist the project atomically.
    #[instrument(skip_all, fields(path = %self.path))]
    pub fn save(&self, project: &Project) -> StoreResult<()> {
        let json = project.snapshot().to_json()?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        };
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!(bytes = json.len(), "state saved");
        Ok(())
    }

    /// Delete the state file. Missing files are fine.
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn remove(&self) -> StoreResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("state file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitCategory;
    use crate::version::Version;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> StateStore {
        let path = Utf8PathBuf::try_from(dir.path().join("state.json")).unwrap();
        StateStore::new(path)
    }

    #[test]
    fn missing_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let outcome = store_in(&dir).load().unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Fresh);
        assert_eq!(outcome.project.current_version(), Version::INITIAL);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut project = Project::default();
        project.commit(CommitCategory::Feat, "feat: add user dashboard", "Alex Chen");
        project.release_now().unwrap();
        project.commit(CommitCategory::Fix, "fix: fix login redirect loop", "Alex Chen");
        store.save(&project).unwrap();
        assert!(store.exists());

        let outcome = store.load().unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Restored);
        let loaded = outcome.project;
        assert_eq!(loaded.current_version(), Version::new(0, 2, 0));
        assert_eq!(loaded.next_version(), Version::new(0, 2, 1));
        assert_eq!(loaded.releases().len(), 1);
        assert_eq!(loaded.snapshot(), project.snapshot());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{\"currentVersion\": oops").unwrap();

        let outcome = store.load().unwrap();
        assert!(matches!(outcome.origin, LoadOrigin::Recovered { .. }));
        assert_eq!(outcome.project.current_version(), Version::new(0, 1, 0));
        assert!(outcome.project.ledger().is_empty());
        assert!(outcome.project.releases().is_empty());
    }

    #[test]
    fn inconsistent_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let orphan = r#"{"allCommits": [{"id": "1", "type": "fix", "message": "fix: x",
            "author": "Tom Brown", "timestamp": "2025-01-01T00:00:00.000Z",
            "versionBefore": "0.1.0", "versionAfter": "0.1.1", "released": true}]}"#;
        std::fs::write(store.path(), orphan).unwrap();

        let outcome = store.load().unwrap();
        assert!(matches!(outcome.origin, LoadOrigin::Recovered { .. }));
        assert!(outcome.project.ledger().is_empty());
    }

    #[test]
    fn unbumpable_version_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let pending = r#"{"id": "1", "type": "breaking", "message": "breaking: drop v1 API",
            "author": "Tom Brown", "timestamp": "2025-01-01T12:00:00.000Z",
            "versionBefore": "18446744073709551615.0.0", "released": false}"#;
        let state = format!(
            r#"{{"currentVersion": {{"major": 18446744073709551615, "minor": 0, "patch": 0}},
                "allCommits": [{pending}], "unreleasedCommits": [{pending}]}}"#
        );
        std::fs::write(store.path(), state).unwrap();

        let outcome = store.load().unwrap();
        assert!(matches!(outcome.origin, LoadOrigin::Recovered { .. }));
        assert_eq!(outcome.project.current_version(), Version::INITIAL);
        assert!(outcome.project.ledger().is_empty());
    }

    #[test]
    fn partial_file_loads_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"currentVersion": {"major": 3, "minor": 1, "patch": 4}}"#)
            .unwrap();

        let outcome = store.load().unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Restored);
        assert_eq!(outcome.project.current_version(), Version::new(3, 1, 4));
        assert!(outcome.project.preferences().dark_mode);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("nested/deeper/state.json")).unwrap();
        let store = StateStore::new(path);
        store.save(&Project::default()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Project::default()).unwrap();
        assert!(store.remove().unwrap());
        assert!(!store.remove().unwrap());
        assert!(!store.exists());
    }
}
