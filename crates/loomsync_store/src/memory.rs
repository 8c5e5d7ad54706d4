//! In-memory cache backend for testing.

use crate::backend::CacheBackend;
use crate::error::StoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory cache backend.
///
/// This backend stores all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral sessions that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use loomsync_store::{CacheBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put("greeting", b"hello").unwrap();
/// assert_eq!(backend.get("greeting").unwrap(), Some(b"hello".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with values.
    ///
    /// Useful for testing restart-recovery scenarios.
    #[must_use]
    pub fn with_values(values: HashMap<String, Vec<u8>>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Removes all stored values.
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

impl CacheBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.values.read().keys().cloned().collect())
    }
}
