//! `ivcompat check` command
//!
//! Every pair must be stored under both drugs with identical entries.
//! `--repair` copies an entry into a missing reverse slot; pairs whose two
//! directions disagree are only reported.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::store::DocumentStore;

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Fill missing reverse entries and save the document
    #[arg(long)]
    pub repair: bool,
}

pub fn run(args: CheckArgs, config: &Config) -> Result<()> {
    let store = DocumentStore::new(config.data_path());
    let mut doc = store
        .load_strict()
        .with_context(|| format!("Cannot check {}", store.path().display()))?;

    if args.repair {
        let repaired = doc.repair_missing_reverse();
        if repaired > 0 {
            store.save(&mut doc)?;
            println!("🔧 Wrote {} missing reverse entries.", repaired);
        }
    }

    let problems = doc.asymmetries();
    if problems.is_empty() {
        println!(
            "✅ {} pair(s) across {} drug(s), all symmetric.",
            doc.pair_count(),
            doc.drug_count()
        );
        return Ok(());
    }

    for problem in &problems {
        println!("  {} {}", "✗".red(), problem);
    }
    bail!(
        "{} asymmetric pair(s) in {}",
        problems.len(),
        store.path().display()
    );
}
