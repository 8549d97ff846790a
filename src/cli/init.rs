//! `ivcompat init` command
//!
//! Creates `.ivcompat/config.toml` and an empty compatibility document.
//!
//! # Usage
//! ```bash
//! ivcompat init                    # Initialize in current directory
//! ivcompat init /path/to/project   # Initialize in specific path
//! ivcompat init --global           # Write ~/.ivcompat/config.toml
//! ```
//!
//! An existing document is never overwritten, even with `--force`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::config::{Config, CONFIG_DIR, CONFIG_FILE};
use crate::core::document::Document;
use crate::core::store::DocumentStore;

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global config (~/.ivcompat)
    #[arg(long)]
    pub global: bool,

    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

/// `data` is the document path requested with `--data`, if any; a relative
/// one is taken relative to the initialized directory
pub fn run(args: InitArgs, data: Option<&Path>) -> Result<()> {
    let base_path = if args.global {
        directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.clone().unwrap_or_else(|| PathBuf::from("."))
    };

    let config_path = base_path.join(CONFIG_DIR).join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    println!("🚀 Initializing ivcompat in: {}", base_path.display());

    let mut config = Config::default();
    if let Some(data) = data {
        config.store.path = data.to_path_buf();
    }
    config
        .save_to(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let doc_path = document_path(&base_path, &config.store.path);
    let doc_created = if doc_path.exists() {
        false
    } else {
        if let Some(parent) = doc_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        DocumentStore::new(&doc_path).save(&mut Document::new())?;
        true
    };

    println!("\n✅ Initialized ivcompat");
    println!("   Config:   {}", config_path.display());
    if doc_created {
        println!("   Document: {} (new)", doc_path.display());
    } else {
        println!("   Document: {} (kept)", doc_path.display());
    }
    println!("\nNext steps:");
    println!("  ivcompat              # start entering pairs");
    println!("  ivcompat stats");

    Ok(())
}

/// Relative store paths are created under the initialized directory
fn document_path(base: &Path, store_path: &Path) -> PathBuf {
    if store_path.is_absolute() {
        store_path.to_path_buf()
    } else {
        base.join(store_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_config_and_document() {
        let dir = tempdir().unwrap();
        let args = InitArgs {
            path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        run(args, None).unwrap();

        let config = Config::load_from(&dir.path().join(CONFIG_DIR).join(CONFIG_FILE)).unwrap();
        assert_eq!(config.entry.stop_word, "stop");

        let doc = DocumentStore::new(dir.path().join("drugInteractions.json"))
            .load_strict()
            .unwrap();
        assert_eq!(doc.drug_count(), 0);
    }

    #[test]
    fn test_init_refuses_without_force() {
        let dir = tempdir().unwrap();
        let args = || InitArgs {
            path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        run(args(), None).unwrap();
        assert!(run(args(), None).is_err());

        let forced = InitArgs {
            force: true,
            ..args()
        };
        run(forced, None).unwrap();
    }

    #[test]
    fn test_init_keeps_existing_document() {
        let dir = tempdir().unwrap();
        let doc_path = dir.path().join("drugInteractions.json");
        std::fs::write(&doc_path, "not json").unwrap();

        let args = InitArgs {
            path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        run(args, None).unwrap();

        assert_eq!(std::fs::read_to_string(&doc_path).unwrap(), "not json");
    }
}
