//! Pending queue dump command.

use loomsync_engine::PendingOp;
use loomsync_store::keys;
use serde::Serialize;
use std::path::Path;

/// One queue entry in dump output.
#[derive(Debug, Serialize)]
pub struct QueueEntry {
    /// Queue position, front first.
    pub position: usize,
    /// Operation kind.
    pub kind: &'static str,
    /// Affected record id.
    pub record_id: String,
    /// Machine number, when the payload carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_no: Option<String>,
}

/// Runs the dump-queue command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache = super::open_cache(path)?;

    let pending: Vec<PendingOp> = cache.load(keys::PENDING, Vec::new());
    let total = pending.len();
    let shown = limit.unwrap_or(total).min(total);

    let entries: Vec<QueueEntry> = pending
        .iter()
        .take(shown)
        .enumerate()
        .map(|(position, op)| QueueEntry {
            position,
            kind: op.kind(),
            record_id: op.record_id().to_string(),
            machine_no: match op {
                PendingOp::Add(record) | PendingOp::Update(record) => {
                    Some(record.machine_no.clone())
                }
                PendingOp::Delete(_) => None,
            },
        })
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => {
            if entries.is_empty() {
                println!("Queue is empty.");
                return Ok(());
            }
            for entry in &entries {
                match &entry.machine_no {
                    Some(machine) => println!(
                        "[{}] {} {} (machine {})",
                        entry.position, entry.kind, entry.record_id, machine
                    ),
                    None => println!("[{}] {} {}", entry.position, entry.kind, entry.record_id),
                }
            }
            if shown < total {
                println!("... {} more", total - shown);
            }
            println!("{total} pending operation(s)");
        }
    }

    Ok(())
}
