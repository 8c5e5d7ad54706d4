//! Records listing command.

use loomsync_core::Record;
use loomsync_store::keys;
use std::path::Path;

/// Runs the records command.
pub fn run(
    path: &Path,
    machine: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache = super::open_cache(path)?;

    let mut records: Vec<Record> = cache.load(keys::RECORDS, Vec::new());
    if let Some(machine) = machine {
        records.retain(|r| r.machine_no == machine);
    }
    records.sort_by(|a, b| (a.date, &a.machine_no).cmp(&(b.date, &b.machine_no)));

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        _ => {
            if records.is_empty() {
                println!("No records.");
                return Ok(());
            }
            println!(
                "{:<12} {:<6} {:<8} {:>6} {:>10} {:>10} {:>10}",
                "date", "shift", "machine", "stops", "weft (m)", "total", "run"
            );
            for r in &records {
                println!(
                    "{:<12} {:<6} {:<8} {:>6} {:>10.1} {:>10} {:>10}",
                    r.date, r.shift, r.machine_no, r.stops, r.weft_meter, r.total, r.run
                );
            }
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}
