//! Cache wipe command.

use loomsync_store::{CacheBackend, FileBackend};
use std::path::Path;
use tracing::info;

/// Runs the wipe command.
pub fn run(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No cache directory at {:?}", path).into());
    }

    let backend = FileBackend::open(path)?;
    let keys = backend.keys()?;

    if !force {
        println!(
            "Would remove {} cache value(s) from {:?}. Re-run with --force to erase.",
            keys.len(),
            path
        );
        return Ok(());
    }

    for key in &keys {
        backend.remove(key)?;
    }
    info!(removed = keys.len(), "cache wiped");
    println!("Removed {} cache value(s).", keys.len());

    Ok(())
}
