use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Errors reading or writing the durable display name.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single durable string value.
pub trait DisplayNameStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, name: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Keeps the display name in one file.
pub struct FileDisplayNameStore {
    path: PathBuf,
}

impl FileDisplayNameStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplayNameStore for FileDisplayNameStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, name: &str) -> Result<(), StorageError> {
        let write_err = |e| StorageError::Write {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        // Write-then-rename: readers never observe a partial name.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, name).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Write {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryDisplayNameStore {
    value: Mutex<Option<String>>,
}

impl MemoryDisplayNameStore {
    pub fn with_value(name: &str) -> Self {
        Self {
            value: Mutex::new(Some(name.to_string())),
        }
    }
}

impl DisplayNameStore for MemoryDisplayNameStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.value.lock().clone())
    }

    fn save(&self, name: &str) -> Result<(), StorageError> {
        *self.value.lock() = Some(name.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.value.lock() = None;
        Ok(())
    }
}
