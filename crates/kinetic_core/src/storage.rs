//! Scroll offset persistence
//!
//! The only state the engine persists is a single float per scroll view:
//! the last pixel offset, or for paged views the last page number. Keys are
//! opaque; the host decides what identifies a scroll view across rebuilds.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Opaque identity of a scroll view for persistence purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(pub String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

/// Failures at the persistence boundary.
///
/// These are the only recoverable errors in the engine; positions log them
/// and keep scrolling.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("malformed stored value for key {0:?}")]
    Malformed(StorageKey),
}

/// Key/value store for scroll offsets.
pub trait ScrollStorage: Send {
    fn write(&mut self, key: &StorageKey, value: f32) -> Result<(), StorageError>;
    fn read(&self, key: &StorageKey) -> Result<Option<f32>, StorageError>;
}

/// Storage handle shared by every position in a host context.
pub type SharedStorage = Arc<Mutex<dyn ScrollStorage>>;

/// In-memory storage, the default backend.
#[derive(Default)]
pub struct MemoryStorage {
    values: FxHashMap<StorageKey, f32>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStorage {
        Arc::new(Mutex::new(Self::new()))
    }
}

impl ScrollStorage for MemoryStorage {
    fn write(&mut self, key: &StorageKey, value: f32) -> Result<(), StorageError> {
        self.values.insert(key.clone(), value);
        Ok(())
    }

    fn read(&self, key: &StorageKey) -> Result<Option<f32>, StorageError> {
        Ok(self.values.get(key).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        let key = StorageKey::new("list");

        assert!(storage.read(&key).unwrap().is_none());
        storage.write(&key, 123.5).unwrap();
        assert_eq!(storage.read(&key).unwrap(), Some(123.5));

        storage.write(&key, 0.0).unwrap();
        assert_eq!(storage.read(&key).unwrap(), Some(0.0));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut storage = MemoryStorage::new();
        storage.write(&StorageKey::new("a"), 1.0).unwrap();
        storage.write(&StorageKey::new("b"), 2.0).unwrap();
        assert_eq!(storage.read(&StorageKey::new("a")).unwrap(), Some(1.0));
        assert_eq!(storage.read(&StorageKey::new("b")).unwrap(), Some(2.0));
    }
}
