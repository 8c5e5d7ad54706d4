//! Cache backend trait definition.

use crate::error::StoreResult;

/// A low-level cache backend for Loomsync.
///
/// Cache backends are **opaque keyed byte stores**. They provide simple
/// operations for reading and replacing whole values. Loomsync owns all
/// value interpretation - backends do not understand records, settings,
/// or pending operations.
///
/// # Invariants
///
/// - `get` returns exactly the bytes most recently `put` for that key
/// - `put` replaces the whole value atomically with respect to `get`
/// - `remove` of an absent key is not an error
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait CacheBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// After this returns successfully, a subsequent `get` observes the
    /// new value even across a process restart (for durable backends).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Returns all keys currently holding a value.
    ///
    /// Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the key set cannot be enumerated.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}
