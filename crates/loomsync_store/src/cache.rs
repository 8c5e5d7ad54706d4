//! Typed cache wrapper with the never-fail load contract.

use crate::backend::CacheBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// A typed view over a [`CacheBackend`].
///
/// `LocalCache` encodes values as CBOR via serde and implements the
/// engine's persistence contract:
///
/// - [`LocalCache::load`] never fails - absent or corrupt data yields the
///   supplied default, so a damaged cache degrades to first-run state
///   instead of blocking the operator.
/// - [`LocalCache::save`] is best-effort - a failed write is logged and
///   the in-memory state remains authoritative for the session.
///
/// # Example
///
/// ```rust
/// use loomsync_store::{InMemoryBackend, LocalCache};
///
/// let cache = LocalCache::new(InMemoryBackend::new());
/// cache.save("names", &vec!["warp".to_string(), "weft".to_string()]);
///
/// let names: Vec<String> = cache.load("names", Vec::new());
/// assert_eq!(names.len(), 2);
/// ```
#[derive(Debug)]
pub struct LocalCache<B: CacheBackend> {
    backend: B,
}

impl<B: CacheBackend> LocalCache<B> {
    /// Creates a cache over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads the value stored under `key`.
    ///
    /// Returns `default` when the key is absent, the backend read fails,
    /// or the stored bytes do not decode as `T`. Decode failures are
    /// logged - they indicate a corrupt or outdated value, and the
    /// versioned key scheme means a newer build simply starts fresh.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, using default");
                return default;
            }
        };

        match ciborium::de::from_reader(bytes.as_slice()) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache value corrupt, using default");
                default
            }
        }
    }

    /// Saves `value` under `key`, best-effort.
    ///
    /// Failures are logged at warn level and otherwise ignored; the
    /// caller's in-memory copy stays authoritative.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let mut bytes = Vec::new();
        if let Err(e) = ciborium::ser::into_writer(value, &mut bytes) {
            warn!(key, error = %e, "cache encode failed, value not persisted");
            return;
        }

        if let Err(e) = self.backend.put(key, &bytes) {
            warn!(key, error = %e, "cache write failed, value not persisted");
        }
    }

    /// Removes the value stored under `key`, best-effort.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "cache remove failed");
        }
    }
}
