//! Configuration module
//!
//! Settings live in `.ivcompat/config.toml` (nearest one walking up from the
//! current directory) or `~/.ivcompat/config.toml`. Every entry point gets
//! the loaded [`Config`] passed in explicitly.
//!
//! Relative paths in a config file resolve against the directory holding
//! `.ivcompat/`, so commands run from a subdirectory use the same document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::compat::Compatibility;

pub const CONFIG_DIR: &str = ".ivcompat";
pub const CONFIG_FILE: &str = "config.toml";
pub const DATA_ENV: &str = "IVCOMPAT_DATA";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub entry: EntryConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub migrate: MigrateConfig,

    /// Directory relative paths resolve against; `None` means the current directory
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Document file; relative paths resolve against the current directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("drugInteractions.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Citation used when the source prompt is left blank
    #[serde(default = "default_citation")]
    pub default_source: String,

    /// Typing this at any prompt ends the session
    #[serde(default = "default_stop_word")]
    pub stop_word: String,

    /// Short codes accepted at the compatibility prompts
    #[serde(default = "default_choices")]
    pub choices: BTreeMap<String, Compatibility>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            default_source: default_citation(),
            stop_word: default_stop_word(),
            choices: default_choices(),
        }
    }
}

fn default_citation() -> String {
    "Trissel’s Handbook 2025".to_string()
}

fn default_stop_word() -> String {
    "stop".to_string()
}

fn default_choices() -> BTreeMap<String, Compatibility> {
    BTreeMap::from([
        ("1".to_string(), Compatibility::Compatible),
        ("2".to_string(), Compatibility::Incompatible),
        ("3".to_string(), Compatibility::Variable),
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Minimum similarity (0.0-1.0) for a fuzzy suggestion
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            fuzzy_cutoff: default_fuzzy_cutoff(),
        }
    }
}

fn default_max_suggestions() -> usize {
    3
}

fn default_fuzzy_cutoff() -> f64 {
    0.8
}

/// Paths for the batch passes; unset values fall back to the store path
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MigrateConfig {
    #[serde(default)]
    pub input: Option<PathBuf>,

    #[serde(default)]
    pub clean_output: Option<PathBuf>,

    #[serde(default)]
    pub regen_output: Option<PathBuf>,
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        // Try local config first, then global
        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load from an explicit path when given, else from default locations
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.base_dir = Some(base_dir_for(path));
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find local .ivcompat/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.ivcompat/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        directories::UserDirs::new().map(|u| u.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Document path with priority:
    /// 1. IVCOMPAT_DATA env var
    /// 2. `store.path` (default `drugInteractions.json`), resolved against
    ///    the config's base directory
    pub fn data_path(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var(DATA_ENV) {
            if !env_path.trim().is_empty() {
                return PathBuf::from(env_path);
            }
        }
        self.resolve(&self.store.path)
    }

    /// Use `path` as the document, relative to the current directory
    pub fn set_data_path(&mut self, path: PathBuf) {
        self.store.path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&path))
                .unwrap_or(path)
        };
    }

    /// Input document for the batch passes
    pub fn migrate_input(&self) -> PathBuf {
        match &self.migrate.input {
            Some(input) => self.resolve(input),
            None => self.data_path(),
        }
    }

    /// Output of `clean`; defaults to rewriting the input
    pub fn clean_output(&self) -> PathBuf {
        match &self.migrate.clean_output {
            Some(output) => self.resolve(output),
            None => self.migrate_input(),
        }
    }

    /// Output of `regen-notes`; defaults to `<stem>_updated.json` next to the input
    pub fn regen_output(&self) -> PathBuf {
        match &self.migrate.regen_output {
            Some(output) => self.resolve(output),
            None => updated_sibling(&self.migrate_input()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Resolve a typed code or value name to a compatibility value
    ///
    /// Blank input means NoData. Returns `None` for anything unrecognized.
    pub fn parse_choice(&self, input: &str) -> Option<Compatibility> {
        let input = input.trim();
        if input.is_empty() {
            return Some(Compatibility::NoData);
        }
        if let Some(value) = self.entry.choices.get(input) {
            return Some(*value);
        }
        input
            .parse::<Compatibility>()
            .ok()
            .filter(|v| *v != Compatibility::NoData)
    }
}

/// Directory a config file's relative paths are anchored to
///
/// For `<dir>/.ivcompat/config.toml` that is `<dir>`; for any other file it
/// is the file's own directory.
fn base_dir_for(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or_else(|| Path::new(""));
    let base = if parent.file_name().is_some_and(|name| name == CONFIG_DIR) {
        parent.parent().unwrap_or_else(|| Path::new(""))
    } else {
        parent
    };
    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base.to_path_buf()
    }
}

/// `<stem>_updated.<ext>` next to `path`
pub fn updated_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "drugInteractions".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "json".to_string());
    path.with_file_name(format!("{}_updated.{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.path, PathBuf::from("drugInteractions.json"));
        assert_eq!(config.entry.stop_word, "stop");
        assert_eq!(config.resolver.max_suggestions, 3);
        assert_eq!(config.resolver.fuzzy_cutoff, 0.8);
        assert_eq!(config.entry.choices.len(), 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            path = "data/iv.json"

            [entry]
            default_source = "Local protocol"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("data/iv.json"));
        assert_eq!(config.entry.default_source, "Local protocol");
        assert_eq!(config.entry.stop_word, "stop");
        assert_eq!(config.resolver.fuzzy_cutoff, 0.8);
    }

    #[test]
    fn test_choices_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [entry.choices]
            c = "Compatible"
            i = "Incompatible"
            "#,
        )
        .unwrap();

        assert_eq!(config.parse_choice("c"), Some(Compatibility::Compatible));
        assert_eq!(config.parse_choice("1"), None);
    }

    #[test]
    fn test_parse_choice() {
        let config = Config::default();
        assert_eq!(config.parse_choice("1"), Some(Compatibility::Compatible));
        assert_eq!(config.parse_choice(" 2 "), Some(Compatibility::Incompatible));
        assert_eq!(config.parse_choice("3"), Some(Compatibility::Variable));
        assert_eq!(config.parse_choice(""), Some(Compatibility::NoData));
        assert_eq!(config.parse_choice("variable"), Some(Compatibility::Variable));
        assert_eq!(config.parse_choice("4"), None);
        assert_eq!(config.parse_choice("no data"), None);
    }

    #[test]
    fn test_migrate_paths() {
        let mut config = Config::default();
        config.migrate.input = Some(PathBuf::from("/data/drugInteractions.json"));

        assert_eq!(config.clean_output(), PathBuf::from("/data/drugInteractions.json"));
        assert_eq!(
            config.regen_output(),
            PathBuf::from("/data/drugInteractions_updated.json")
        );

        config.migrate.regen_output = Some(PathBuf::from("/tmp/out.json"));
        assert_eq!(config.regen_output(), PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn test_paths_resolve_against_project_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        let mut config = Config::default();
        config.migrate.regen_output = Some(PathBuf::from("out/notes.json"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_dir.as_deref(), Some(dir.path()));
        assert_eq!(loaded.data_path(), dir.path().join("drugInteractions.json"));
        assert_eq!(loaded.clean_output(), dir.path().join("drugInteractions.json"));
        assert_eq!(loaded.regen_output(), dir.path().join("out/notes.json"));
    }

    #[test]
    fn test_base_dir_for_plain_file() {
        assert_eq!(base_dir_for(Path::new("/etc/ivcompat.toml")), PathBuf::from("/etc"));
        assert_eq!(base_dir_for(Path::new("ivcompat.toml")), PathBuf::from("."));
        assert_eq!(
            base_dir_for(Path::new("/srv/pharmacy/.ivcompat/config.toml")),
            PathBuf::from("/srv/pharmacy")
        );
    }

    #[test]
    fn test_set_data_path_is_cwd_relative() {
        let mut config = Config::default();
        config.base_dir = Some(PathBuf::from("/srv/pharmacy"));

        config.set_data_path(PathBuf::from("/tmp/iv.json"));
        assert_eq!(config.store.path, PathBuf::from("/tmp/iv.json"));

        config.set_data_path(PathBuf::from("iv.json"));
        assert!(config.store.path.is_absolute());
        assert!(config.store.path.ends_with("iv.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        let mut config = Config::default();
        config.entry.default_source = "Hospital formulary".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.entry.default_source, "Hospital formulary");
        assert_eq!(loaded.entry.choices, config.entry.choices);
    }
}
