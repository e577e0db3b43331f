//! Storage layer for Ferry data.
//!
//! All state lives in a single directory inside the project:
//!
//! ```text
//! <root>/.ferry/
//!   config.kdl                     project configuration
//!   progress.json                  one Migration document
//!   requirements/
//!     <segment>/.../<name>.json    one Requirement document per path
//! ```
//!
//! Every write goes to a temporary file in the target directory that is then
//! renamed over the destination, so a reader sees either the old document or
//! the new one and never a partial write.

pub mod requirements;
pub mod safe_path;

pub use requirements::PathFilter;
pub use safe_path::SafeReqPath;

use crate::models::{Migration, PROGRESS_VERSION};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the state directory inside a project.
pub const STATE_DIR: &str = ".ferry";

/// Progress document file name.
pub const PROGRESS_FILE: &str = "progress.json";

/// Requirements directory name.
pub const REQUIREMENTS_DIR: &str = "requirements";

/// Project configuration file name.
pub const CONFIG_FILE: &str = "config.kdl";

/// Storage manager for a single project.
///
/// Holds no documents in memory; every call reads from or writes to disk.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Project root the migration applies to
    root: PathBuf,
}

impl Storage {
    /// Storage rooted at the given project directory. Nothing is created until a write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/.ferry`
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.state_dir().join(PROGRESS_FILE)
    }

    pub fn requirements_dir(&self) -> PathBuf {
        self.state_dir().join(REQUIREMENTS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join(CONFIG_FILE)
    }

    /// Load progress. Returns `None` if no migration has been started.
    pub fn load_progress(&self) -> Result<Option<Migration>> {
        let path = self.progress_path();
        let Some(migration) = read_json::<Migration>(&path)? else {
            return Ok(None);
        };

        if migration.version() > PROGRESS_VERSION {
            return Err(Error::UnsupportedVersion(migration.version()));
        }
        Ok(Some(migration))
    }

    /// Atomically write progress.
    pub fn save_progress(&self, migration: &Migration) -> Result<()> {
        write_json_atomic(&self.progress_path(), migration)?;
        tracing::debug!(current_step = migration.current_step(), "saved progress");
        Ok(())
    }

    /// Remove progress. Removing progress that doesn't exist is not an error.
    pub fn delete_progress(&self) -> Result<()> {
        remove_if_exists(&self.progress_path())
    }

    /// Check if a progress document exists.
    pub fn progress_exists(&self) -> bool {
        self.progress_path().is_file()
    }

    /// The step currently active according to progress, or empty if none.
    pub fn current_step(&self) -> Result<String> {
        Ok(self
            .load_progress()?
            .map(|m| m.current_step().to_string())
            .unwrap_or_default())
    }
}

/// Read a JSON document. Returns `None` if the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::Storage {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    tracing::debug!(path = %path.display(), "read document");
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| Error::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `value` as pretty JSON and write it atomically.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    write_atomic(path, &data)
}

/// Write `data` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let storage_err = |source: io::Error| Error::Storage {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
    fs::create_dir_all(dir).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(data).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote document");
    Ok(())
}

/// Remove a file, treating a missing file as success.
pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed document");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Storage {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepStatus;
    use crate::test_utils::TestEnv;
    use std::collections::BTreeMap;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_progress_missing() {
        let env = TestEnv::new();
        let storage = env.storage();

        assert!(storage.load_progress().unwrap().is_none());
        assert!(!storage.progress_exists());
        assert_eq!(storage.current_step().unwrap(), "");
    }

    #[test]
    fn test_progress_roundtrip() {
        let env = TestEnv::new();
        let storage = env.storage();

        let mut m = Migration::new(env.path().display().to_string(), ids(&["1", "2", "3"]));
        m.start_step("2").unwrap();
        m.complete_step("1", "first done").unwrap();
        storage.save_progress(&m).unwrap();

        let loaded = storage.load_progress().unwrap().unwrap();
        assert_eq!(loaded, m);
        assert_eq!(loaded.current_step(), "2");
        assert_eq!(loaded.step_order(), ids(&["1", "2", "3"]).as_slice());
        assert_eq!(loaded.step("1").unwrap().status(), StepStatus::Completed);
        assert_eq!(loaded.step("3").unwrap().status(), StepStatus::Pending);
        assert_eq!(storage.current_step().unwrap(), "2");
    }

    #[test]
    fn test_progress_file_location() {
        let env = TestEnv::new();
        let storage = env.storage();
        storage
            .save_progress(&Migration::new("/p", ids(&["1"])))
            .unwrap();

        let path = env.path().join(".ferry").join("progress.json");
        assert!(path.is_file());
        let text = fs::read_to_string(path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"step_order\""));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let env = TestEnv::new();
        let storage = env.storage();
        let m = Migration::new("/p", ids(&["1"]));
        storage.save_progress(&m).unwrap();
        storage.save_progress(&m).unwrap();

        let entries: Vec<_> = fs::read_dir(storage.state_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("progress.json")]);
    }

    #[test]
    fn test_delete_progress() {
        let env = TestEnv::new();
        let storage = env.storage();
        storage
            .save_progress(&Migration::new("/p", ids(&["1"])))
            .unwrap();

        storage.delete_progress().unwrap();
        assert!(storage.load_progress().unwrap().is_none());

        // Deleting again is fine
        storage.delete_progress().unwrap();
    }

    #[test]
    fn test_corrupt_progress_is_error() {
        let env = TestEnv::new();
        let storage = env.storage();
        fs::create_dir_all(storage.state_dir()).unwrap();
        fs::write(storage.progress_path(), "{ not json").unwrap();

        let err = storage.load_progress().unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert!(err.to_string().contains("progress.json"));
    }

    #[test]
    fn test_newer_progress_version_refused() {
        let env = TestEnv::new();
        let storage = env.storage();
        fs::create_dir_all(storage.state_dir()).unwrap();
        fs::write(
            storage.progress_path(),
            r#"{"version": 99, "started_at": "2024-01-01T00:00:00Z", "project_path": "/p",
                "current_step": "", "steps": {}, "step_order": []}"#,
        )
        .unwrap();

        assert!(matches!(
            storage.load_progress(),
            Err(Error::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_failed_save_keeps_previous_document() {
        let env = TestEnv::new();
        let storage = env.storage();
        let original = Migration::new("/p", ids(&["1"]));
        storage.save_progress(&original).unwrap();

        // A directory at the destination makes the rename fail.
        let blocked = storage.state_dir().join("blocked.json");
        fs::create_dir_all(blocked.join("child")).unwrap();
        assert!(write_json_atomic(&blocked, &original).is_err());

        assert_eq!(storage.load_progress().unwrap().unwrap(), original);
        assert_eq!(state_entries(&storage), ["blocked.json", "progress.json"]);
    }

    #[test]
    fn test_failed_rewrite_keeps_same_document() {
        let env = TestEnv::new();
        let storage = env.storage();
        let original = Migration::new("/p", ids(&["1", "2"]));
        storage.save_progress(&original).unwrap();
        let before = fs::read(storage.progress_path()).unwrap();

        // Non-string map keys cannot be written as JSON.
        let unwritable: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);
        assert!(write_json_atomic(&storage.progress_path(), &unwritable).is_err());

        assert_eq!(fs::read(storage.progress_path()).unwrap(), before);
        assert_eq!(storage.load_progress().unwrap().unwrap(), original);
        assert_eq!(state_entries(&storage), ["progress.json"]);
    }

    fn state_entries(storage: &Storage) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(storage.state_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
