//! The durable key-value store sessions and settings persist through.
//!
//! Values are JSON strings stored under well-known keys, the same way a
//! browser's local storage would hold them.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Key the session history is stored under
pub const SESSIONS_KEY: &str = "cardRecognitionSessions";

/// Key the user settings are stored under
pub const SETTINGS_KEY: &str = "cardRecognitionSettings";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create storage directory '{directory}': {error}")]
    CreateDirectory {
        directory: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to read '{key}': {error}")]
    Read { key: String, error: std::io::Error },

    #[error("Failed to write '{key}': {error}")]
    Write { key: String, error: std::io::Error },

    #[error("Failed to remove '{key}': {error}")]
    Remove { key: String, error: std::io::Error },
}

/// A string-valued key-value store
pub trait Storage {
    /// Returns the value under `key`, or `None` if nothing is stored
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Storage backed by one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Opens (and creates, if needed) a storage directory
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let directory = directory.into();
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|error| StorageError::CreateDirectory {
                directory: directory.clone(),
                error,
            })?;
        }
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Read {
                key: key.to_string(),
                error,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write next to the target and rename, so a crash never leaves half a file
        let path = self.path(key);
        let temporary = path.with_extension("json.tmp");
        fs::write(&temporary, value)
            .and_then(|()| fs::rename(&temporary, &path))
            .map_err(|error| StorageError::Write {
                key: key.to_string(),
                error,
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(StorageError::Remove {
                key: key.to_string(),
                error,
            }),
            _ => Ok(()),
        }
    }
}
