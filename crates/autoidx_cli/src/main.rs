//! autoidx CLI
//!
//! Offline tools for an index storage root. Nothing here takes the root's
//! `LOCK` file, so the commands can run next to a live store.
//!
//! # Commands
//!
//! - `list` - List every index directory and its definition
//! - `inspect` - Show the full definition of one index
//! - `verify` - Check what recovery would do with the root

mod commands;

use autoidx_core::{IndexId, DEFAULT_INDEX_STORAGE_PATH};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// autoidx index storage tools.
#[derive(Parser)]
#[command(name = "autoidx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the index storage root
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
    /// List index directories under the root
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show the stored definition of one index
    Inspect {
        /// Index identifier (the directory name)
        id: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Report directories recovery would skip, reject or supersede
    Verify {
        /// Treat incomplete directories as failures
        #[arg(short, long)]
        strict: bool,
    },

    /// Show version information
    Version,
}

/// Output format shared by the read commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = cli
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_STORAGE_PATH));

    match cli.command {
        Commands::List { format } => commands::list::run(&root, format)?,
        Commands::Inspect { id, format } => {
            commands::inspect::run(&root, IndexId::new(id), format)?;
        }
        Commands::Verify { strict } => commands::verify::run(&root, strict)?,
        Commands::Version => {
            println!("autoidx CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
