//! `ivcompat config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! ivcompat config                              # Show the active config file
//! ivcompat config entry.default_source         # Get specific value
//! ivcompat config resolver.fuzzy_cutoff 0.75   # Set value
//! ivcompat config entry.choices.4 Variable     # Add a code
//! ivcompat config --path                       # Show config file locations
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use toml_edit::{DocumentMut, Item};

use crate::config::{Config, CONFIG_DIR, CONFIG_FILE};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config key (e.g., store.path, entry.stop_word)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.ivcompat/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

/// File the command reads and edits
///
/// An explicit `--config` wins, then `--global`, then the nearest local
/// config, then `.ivcompat/config.toml` in the current directory.
fn config_path(args: &ConfigArgs, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if args.global {
        if let Some(global) = Config::global_config_path() {
            return global;
        }
    }
    Config::find_local_config().unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let config_path = config_path(&args, explicit);

    if args.path {
        if let Some(global) = Config::global_config_path() {
            println!("Global: {}", global.display());
        }
        println!("Local:  {}", PathBuf::from(CONFIG_DIR).join(CONFIG_FILE).display());
        println!();
        if config_path.exists() {
            println!("✓ Active: {}", config_path.display());
        } else {
            println!("⚠ No config file found at {}", config_path.display());
        }
        return Ok(());
    }

    match (&args.key, &args.value) {
        (None, _) => {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)?;
                println!("📋 Configuration ({}):\n", config_path.display());
                println!("{}", content);
            } else {
                println!("📋 No config file at {}, using defaults:\n", config_path.display());
                println!("{}", toml::to_string_pretty(&Config::default())?);
            }
        }
        (Some(key), Some(value)) => {
            set_config_value(&config_path, key, value)?;
            println!("✅ Set {} = {} (in {})", key, value, config_path.display());
        }
        (Some(key), None) => match get_config_value(&config_path, key)? {
            Some(v) => println!("{}", v),
            None => println!("(not set)"),
        },
    }

    Ok(())
}

/// Set a nested config value using dot notation (e.g., "entry.stop_word")
///
/// The edited file must still load as a [`Config`]; a value that does not
/// fit its typed form is retried as a plain string.
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut edited = None;
    for candidate in [parse_toml_value(val), toml_edit::Value::from(val)] {
        let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;
        set_path(&mut doc, key, candidate)?;
        let text = doc.to_string();
        if toml::from_str::<Config>(&text).is_ok() {
            edited = Some(text);
            break;
        }
    }

    let text = edited.ok_or_else(|| anyhow!("Invalid value for {}: {}", key, val))?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn set_path(doc: &mut DocumentMut, key: &str, val: toml_edit::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, sections)) = parts.split_last() else {
        bail!("Empty config key");
    };
    if parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid config key: {}", key);
    }

    let mut table = doc.as_table_mut();
    for section in sections {
        table = table
            .entry(section)
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or_else(|| anyhow!("{} is not a section", section))?;
    }
    table.insert(last, Item::Value(val));
    Ok(())
}

/// Get a config value by dot notation key
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc: toml::Table = content.parse().context("Failed to parse config.toml")?;

    let mut parts = key.split('.');
    let mut current = parts.next().and_then(|first| doc.get(first));
    for part in parts {
        current = current.and_then(|v| v.get(part));
    }

    Ok(current.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    if s == "true" {
        return true.into();
    }
    if s == "false" {
        return false.into();
    }

    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }

    if let Ok(f) = s.parse::<f64>() {
        return f.into();
    }

    s.into()
}
