//! Loomsync CLI
//!
//! Maintenance tools for a Loomsync local cache directory.
//!
//! # Commands
//!
//! - `status` - Summarize cache contents and pending work
//! - `records` - List cached shift records
//! - `dump-queue` - Dump the pending operation queue for debugging
//! - `wipe` - Erase the cache directory contents

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Loomsync cache maintenance tools.
#[derive(Parser)]
#[command(name = "loomsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the cache directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize cache contents and pending work
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List cached shift records
    Records {
        /// Only records for this machine
        #[arg(short, long)]
        machine: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump the pending operation queue for debugging
    DumpQueue {
        /// Maximum number of operations to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Erase the cache directory contents
    Wipe {
        /// Confirm the erase; without it nothing is deleted
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = cli.path.ok_or("Cache path required (--path)")?;

    match cli.command {
        Commands::Status { format } => {
            commands::status::run(&path, &format)?;
        }
        Commands::Records { machine, format } => {
            commands::records::run(&path, machine.as_deref(), &format)?;
        }
        Commands::DumpQueue { limit, format } => {
            commands::dump_queue::run(&path, limit, &format)?;
        }
        Commands::Wipe { force } => {
            commands::wipe::run(&path, force)?;
        }
    }

    Ok(())
}
