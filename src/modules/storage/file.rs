use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{KeyValueStore, StorageError};

/// Storage that keeps each slot in its own file under a data directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        // Write next to the target, then rename over it
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(value.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(self.slot_path(key))
            .map_err(|e| StorageError::Io(e.error))?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(temp_dir.path().join("data"));

        // Directory doesn't exist yet, slot reads as empty
        assert_eq!(storage.get("users").unwrap(), None);

        storage.set("users", "[{\"id\":\"a\"}]").unwrap();
        assert!(storage.slot_path("users").exists());
        assert_eq!(
            storage.get("users").unwrap().as_deref(),
            Some("[{\"id\":\"a\"}]")
        );

        // Overwrite replaces the whole blob
        storage.set("users", "[]").unwrap();
        assert_eq!(storage.get("users").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(temp_dir.path());

        storage.set("currentUser", "{}").unwrap();
        storage.remove("currentUser").unwrap();
        assert!(!storage.slot_path("currentUser").exists());
        assert!(storage.remove("currentUser").is_ok());
    }

    #[test]
    fn test_no_staging_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(temp_dir.path());

        storage.set("users", "[]").unwrap();
        storage.set("currentUser", "{}").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|name| name.ends_with(".json")));
    }
}
