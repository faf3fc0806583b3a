//! Application configuration for Quantifying.
//!
//! User config lives at `~/.quantifying/quantifying.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuantifyingError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "quantifying.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".quantifying";

// ---------------------------------------------------------------------------
// Config structs (matching quantifying.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Whether generated reports are written back to disk.
    #[serde(default)]
    pub enable_save: bool,

    /// Whether git fetch/merge/commit/push run at all.
    #[serde(default)]
    pub enable_git: bool,

    /// Repository root containing the `data/` tree.
    #[serde(default = "default_repo")]
    pub repo: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            enable_save: false,
            enable_git: false,
            repo: default_repo(),
        }
    }
}

fn default_repo() -> String {
    ".".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime switches, merged from the config file and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunConfig {
    /// Gate for document write-back.
    pub enable_save: bool,
    /// Gate for every git operation.
    pub enable_git: bool,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            enable_save: config.defaults.enable_save,
            enable_git: config.defaults.enable_git,
        }
    }
}

impl RunConfig {
    /// Apply CLI overrides. A flag can only switch a gate on, never off.
    pub fn with_overrides(self, enable_save: bool, enable_git: bool) -> Self {
        Self {
            enable_save: self.enable_save || enable_save,
            enable_git: self.enable_git || enable_git,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.quantifying/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| QuantifyingError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.quantifying/quantifying.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QuantifyingError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        QuantifyingError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| QuantifyingError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| QuantifyingError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| QuantifyingError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
