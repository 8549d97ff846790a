//! `ivcompat clean` and `ivcompat regen-notes` commands
//!
//! One-shot passes over a stored document.
//!
//! # Usage
//! ```bash
//! ivcompat clean                          # rewrite the document in place
//! ivcompat regen-notes                    # writes drugInteractions_updated.json
//! ivcompat regen-notes --output notes.json
//! ```
//!
//! Paths default to the `[migrate]` config section, then to the store path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{self, Config};
use crate::core::document::Document;
use crate::core::migrate::{self, MigrationReport};
use crate::core::store::DocumentStore;

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Document to read (default: migrate.input, then the store path)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Where to write the result
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Drop "No Data" values from every compatibility record
pub fn run_clean(args: MigrateArgs, config: &Config) -> Result<()> {
    let input = args.input.clone().unwrap_or_else(|| config.migrate_input());
    let output = args.output.clone().unwrap_or_else(|| {
        if args.input.is_some() {
            input.clone()
        } else {
            config.clean_output()
        }
    });

    let report = run_pass(&input, &output, migrate::clean_compatibility)?;
    println!(
        "✅ Migration complete: cleaned {} of {} entries.",
        report.changed, report.visited
    );
    println!("   Output: {}", output.display());
    Ok(())
}

/// Recompute every note with the note generator
pub fn run_regen(args: MigrateArgs, config: &Config) -> Result<()> {
    let input = args.input.clone().unwrap_or_else(|| config.migrate_input());
    let output = match (&args.output, &args.input) {
        (Some(output), _) => output.clone(),
        (None, Some(input)) => config::updated_sibling(input),
        (None, None) => config.regen_output(),
    };

    let report = run_pass(&input, &output, migrate::regenerate_notes)?;
    println!(
        "✅ Notes regenerated: {} of {} entries changed.",
        report.changed, report.visited
    );
    println!("   Output: {}", output.display());
    Ok(())
}

fn run_pass(
    input: &Path,
    output: &Path,
    pass: fn(&mut Document) -> MigrationReport,
) -> Result<MigrationReport> {
    let mut doc = DocumentStore::new(input)
        .load_strict()
        .with_context(|| format!("Cannot migrate {}", input.display()))?;

    let report = pass(&mut doc);

    DocumentStore::new(output)
        .write(&doc)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(report)
}
