pub mod file;
pub mod memory;

use std::io;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Custom error type for the persistence boundary
#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Encode(String),
    Corrupt { key: String, reason: String },
}

// Implement conversion from io::Error to StorageError
impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Encode(error.to_string())
    }
}

// Implementation of Display trait for StorageError
impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Encode(msg) => write!(f, "Encoding error: {}", msg),
            StorageError::Corrupt { key, reason } => {
                write!(f, "Corrupt data in slot '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Synchronous string store addressed by slot name.
///
/// Each slot holds one whole blob; a `set` replaces it entirely and readers
/// never observe a partial value.
pub trait KeyValueStore {
    /// Returns the blob stored under `key`, or `None` if the slot is empty
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites the slot with `value`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Empties the slot. Removing an empty slot is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
