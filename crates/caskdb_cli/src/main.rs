//! CaskDB CLI
//!
//! Command-line tools for CaskDB data directories.
//!
//! # Commands
//!
//! - `inspect` - Display segment statistics
//! - `verify` - Verify segment integrity by scanning every record
//! - `compact` - Fold sealed segments into one merged segment
//! - `get` / `put` - Read and write individual keys

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CaskDB command-line data directory tools.
#[derive(Parser)]
#[command(name = "caskdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
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
    /// Display segment statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify segment integrity by scanning every record
    Verify,

    /// Fold sealed segments into one merged segment
    Compact,

    /// Read the value stored under a key
    Get {
        /// The key to read
        key: String,

        /// Read the value as an int64
        #[arg(long)]
        int64: bool,
    },

    /// Store a value under a key
    Put {
        /// The key to write
        key: String,

        /// The value to store
        value: String,

        /// Store the value as an int64
        #[arg(long)]
        int64: bool,
    },

    /// Show version information
    Version,
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

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Data directory required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Data directory required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Compact => {
            let path = cli.path.ok_or("Data directory required for compact")?;
            commands::compact::run(&path)?;
        }
        Commands::Get { key, int64 } => {
            let path = cli.path.ok_or("Data directory required for get")?;
            commands::get::run(&path, &key, int64)?;
        }
        Commands::Put { key, value, int64 } => {
            let path = cli.path.ok_or("Data directory required for put")?;
            commands::put::run(&path, &key, &value, int64)?;
        }
        Commands::Version => {
            println!("CaskDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("CaskDB Core v{}", caskdb_core::VERSION);
        }
    }

    Ok(())
}
