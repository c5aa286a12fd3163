//! Local key-value persistence with file locking.
//!
//! Each key is stored as a JSON blob `<key>.json` in the data directory.
//! Reads take a shared lock, writes go through a locked temp file that is
//! synced and renamed over the original.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SETTINGS_KEY: &str = "user_settings";
pub const PROGRESS_KEY: &str = "user_progress";
pub const NOTIFICATIONS_KEY: &str = "scheduled_notifications";

#[derive(Clone, Debug)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the value stored under `key`
    ///
    /// Returns `None` if nothing is stored. Unreadable or corrupted blobs are
    /// logged and also treated as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !path.exists() {
            tracing::debug!("No stored value for '{}'", key);
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Ignoring stored value.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Ignoring stored value.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Ignoring stored value.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<T>(&contents) {
            Ok(value) => {
                tracing::debug!("Loaded '{}' from {:?}", key, path);
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Ignoring stored value.", path, e);
                Ok(None)
            }
        }
    }

    /// Read `key`, falling back to `T::default()`
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Atomically store `value` under `key`
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved '{}' to {:?}", key, path);
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<T, F>(&self, key: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<()>,
    {
        let mut value: T = self.get_or_default(key)?;
        f(&mut value)?;
        self.put(key, &value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UserProgress, UserSettings};

    #[test]
    fn test_put_and_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        let mut progress = UserProgress::default();
        progress.total_workouts = 3;
        progress.achievements.insert("first_workout".into());
        store.put(PROGRESS_KEY, &progress).unwrap();

        let loaded: UserProgress = store.get(PROGRESS_KEY).unwrap().unwrap();
        assert_eq!(loaded, progress);
    }

    #[test]
    fn test_missing_key_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path().join("not-yet-created"));

        let loaded: Option<UserSettings> = store.get(SETTINGS_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupted_blob_is_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        std::fs::write(store.path_for(SETTINGS_KEY), "{ invalid json }").unwrap();

        let loaded: UserSettings = store.get_or_default(SETTINGS_KEY).unwrap();
        assert_eq!(loaded, UserSettings::default());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        store
            .update(PROGRESS_KEY, |p: &mut UserProgress| {
                p.total_focus_sessions += 1;
                Ok(())
            })
            .unwrap();
        store
            .update(PROGRESS_KEY, |p: &mut UserProgress| {
                p.total_focus_sessions += 1;
                Ok(())
            })
            .unwrap();

        let loaded: UserProgress = store.get_or_default(PROGRESS_KEY).unwrap();
        assert_eq!(loaded.total_focus_sessions, 2);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        store.put(SETTINGS_KEY, &UserSettings::default()).unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["user_settings.json".to_string()]);
    }
}
