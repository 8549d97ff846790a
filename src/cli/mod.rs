//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod add;
pub mod check;
pub mod config;
pub mod init;
pub mod migrate;
pub mod prompt;
pub mod show;
pub mod stats;

/// ivcompat - IV drug compatibility knowledge base
///
/// Records route-by-route compatibility for drug pairs and writes a
/// clinical note for each pair. Run without a command to start entering data.
#[derive(Parser, Debug)]
#[command(name = "ivcompat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "IVCOMPAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Compatibility document (overrides store.path)
    #[arg(short, long, global = true, env = "IVCOMPAT_DATA")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enter compatibility pairs interactively (default)
    Add(add::AddArgs),

    /// Drop "No Data" values from every stored record
    Clean(migrate::MigrateArgs),

    /// Regenerate every note from its compatibility record
    RegenNotes(migrate::MigrateArgs),

    /// Verify that every pair is stored in both directions
    Check(check::CheckArgs),

    /// Show a drug's partners or a single pair
    Show(show::ShowArgs),

    /// Show document statistics
    Stats(stats::StatsArgs),

    /// Create a config file and an empty document
    Init(init::InitArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),
}
