//! ivcompat CLI - Entry point
//!
//! Usage: ivcompat [command] [options]

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ivcompat::cli::{self, Cli, Commands};
use ivcompat::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with prompts or command output
    let filter = if cli.verbose {
        EnvFilter::new("ivcompat=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Add(cli::add::AddArgs::default()));
    let load = || load_config(cli.config.as_deref(), cli.data.clone());

    match command {
        // These work on config files directly
        Commands::Init(args) => cli::init::run(args, cli.data.as_deref()),
        Commands::Config(args) => cli::config::run(args, cli.config.as_deref()),
        Commands::Add(args) => cli::add::run(args, &load()?),
        Commands::Clean(args) => cli::migrate::run_clean(args, &load()?),
        Commands::RegenNotes(args) => cli::migrate::run_regen(args, &load()?),
        Commands::Check(args) => cli::check::run(args, &load()?),
        Commands::Show(args) => cli::show::run(args, &load()?),
        Commands::Stats(args) => cli::stats::execute(args, &load()?),
    }
}

fn load_config(explicit: Option<&Path>, data: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_with(explicit)?;
    if let Some(data) = data {
        config.set_data_path(data);
    }
    tracing::debug!(path = %config.data_path().display(), "using document");
    Ok(config)
}
