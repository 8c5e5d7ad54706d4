//! # Loomsync Store
//!
//! Local cache backends and the typed cache wrapper for Loomsync.
//!
//! This crate provides the lowest-level persistence abstraction for the
//! sync engine. Cache backends are **opaque keyed byte stores** - they do
//! not interpret the values they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple keyed byte stores (get, put, remove)
//! - No knowledge of Loomsync entities or serialization formats
//! - Must be `Send + Sync` for concurrent access
//! - [`LocalCache`] owns all value encoding (CBOR via serde)
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral state
//! - [`FileBackend`] - For persistent storage, one file per key
//!
//! ## Example
//!
//! ```rust
//! use loomsync_store::{CacheBackend, InMemoryBackend, LocalCache};
//!
//! let cache = LocalCache::new(InMemoryBackend::new());
//! cache.save("counter", &7u32);
//! assert_eq!(cache.load("counter", 0u32), 7);
//! assert_eq!(cache.load("missing", 42u32), 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod cache;
mod error;
mod file;
mod memory;

pub mod keys;

pub use backend::CacheBackend;
pub use cache::LocalCache;
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
