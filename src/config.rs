//! Tool configuration.
//!
//! Handles loading, validating, and merging `xtag.toml`. Stock defaults are
//! overridden by the user's file, which is looked up in the working directory
//! unless `--config <path>` names one explicitly.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! recipes_file = "custom_recipes.json"  # Default recipe list (JSON)
//! log_file = "xtag.log"                 # Written only with --verbose
//! exiftool = "exiftool"                 # exiftool executable
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "xtag.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {CONFIG_FILE_NAME}: {0}")]
    Io(#[from] std::io::Error),
    #[error("{CONFIG_FILE_NAME} is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("bad {CONFIG_FILE_NAME} value: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `xtag.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// JSON file holding the default recipe list.
    pub recipes_file: String,
    /// Log destination when running with `--verbose`.
    pub log_file: String,
    /// exiftool executable, looked up on `PATH` unless absolute.
    pub exiftool: String,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            recipes_file: "custom_recipes.json".to_string(),
            log_file: "xtag.log".to_string(),
            exiftool: "exiftool".to_string(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("recipes_file", &self.recipes_file),
            ("log_file", &self.log_file),
            ("exiftool", &self.exiftool),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Images read and renamed in parallel; unset means one per core.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: `max_processes`, never above the core count.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match config.max_processes {
        Some(limit) if limit < cores => limit,
        _ => cores,
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Lay a user `xtag.toml` over the defaults. Sections such as `[processing]`
/// merge per key; any other value in the overlay wins outright.
pub fn merge_toml(mut base: toml::Value, overlay: toml::Value) -> toml::Value {
    merge_into(&mut base, overlay);
    base
}

fn merge_into(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(table), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match table.get_mut(&key) {
                    Some(current) => merge_into(current, value),
                    None => {
                        table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `xtag.toml` from `dir`, falling back to defaults when absent.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let overlay = if path.exists() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(Some(load_raw_config(path)?))
}

/// Returns a fully-commented stock `xtag.toml` with all keys and explanations.
///
/// Used by `xtag --gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# xtag Configuration
# ==================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# xtag reads ./xtag.toml, or the file given with --config.
# Unknown keys will cause an error.

# JSON list of recipes tried in order, first full match wins:
#   [{ "name": "Kodachrome 64", "settings": { "FilmMode": "Classic Chrome" } }]
# Recipes passed with --recipes-json (or $user_custom_recipes) are tried first.
recipes_file = "custom_recipes.json"

# Log file written when running with --verbose.
log_file = "xtag.log"

# exiftool executable. A bare name is looked up on PATH.
exiftool = "exiftool"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images read and renamed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
