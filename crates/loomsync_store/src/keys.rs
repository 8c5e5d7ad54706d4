//! Versioned cache keys, one per persisted entity collection.
//!
//! The version suffix lets a future format change start from a clean key
//! instead of tripping over old bytes; [`crate::LocalCache::load`] treats
//! the old key's value as absent.

/// All records, keyed by record id.
pub const RECORDS: &str = "loomsync.records.v1";

/// The settings singleton.
pub const SETTINGS: &str = "loomsync.settings.v1";

/// The pending operation queue.
pub const PENDING: &str = "loomsync.pending.v1";
