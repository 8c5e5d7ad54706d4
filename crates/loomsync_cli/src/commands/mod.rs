//! CLI command implementations.

pub mod dump_queue;
pub mod records;
pub mod status;
pub mod wipe;

use loomsync_store::{FileBackend, LocalCache};
use std::path::Path;

/// Opens the cache at `path`, refusing a directory that does not exist.
pub fn open_cache(path: &Path) -> Result<LocalCache<FileBackend>, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No cache directory at {:?}", path).into());
    }
    Ok(LocalCache::new(FileBackend::open(path)?))
}
