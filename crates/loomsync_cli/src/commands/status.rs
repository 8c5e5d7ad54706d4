//! Status command implementation.

use loomsync_core::{Record, Settings};
use loomsync_engine::PendingOp;
use loomsync_store::keys;
use serde::Serialize;
use std::path::Path;

/// Cache status summary.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// Cache directory.
    pub path: String,
    /// Number of cached records.
    pub record_count: usize,
    /// Number of pending operations awaiting upload.
    pub pending_count: usize,
    /// Whether a remote store is configured.
    pub remote_configured: bool,
    /// Configured machine count.
    pub machine_count: u32,
    /// Alert threshold percent.
    pub alert_threshold: u8,
}

/// Runs the status command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cache = super::open_cache(path)?;

    let records: Vec<Record> = cache.load(keys::RECORDS, Vec::new());
    let pending: Vec<PendingOp> = cache.load(keys::PENDING, Vec::new());
    let settings: Settings = cache.load(keys::SETTINGS, Settings::default());

    let result = StatusResult {
        path: path.display().to_string(),
        record_count: records.len(),
        pending_count: pending.len(),
        remote_configured: settings.has_remote_config(),
        machine_count: settings.machine_count,
        alert_threshold: settings.alert_threshold,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Cache: {}", result.path);
            println!("  records:          {}", result.record_count);
            println!("  pending uploads:  {}", result.pending_count);
            println!(
                "  remote:           {}",
                if result.remote_configured {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!("  machines:         {}", result.machine_count);
            println!("  alert threshold:  {}%", result.alert_threshold);
        }
    }

    Ok(())
}
