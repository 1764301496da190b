//! Application configuration for Salescope.
//!
//! User config lives at `~/.salescope/salescope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalescopeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "salescope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".salescope";

// ---------------------------------------------------------------------------
// Config structs (matching salescope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Evaluation behaviour.
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Report output formatting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[evaluation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Emit warning-severity issues (touch ordering, recommended sizes, ...).
    #[serde(default = "default_true")]
    pub soft_checks: bool,

    /// How per-item score keys are chosen when natural names collide.
    #[serde(default)]
    pub item_key: ItemKeyPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            soft_checks: true,
            item_key: ItemKeyPolicy::default(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON reports.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

fn default_true() -> bool {
    true
}

/// Key policy for `item_field_scores`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKeyPolicy {
    /// First item keeps its natural key; later collisions become `<name>#<index>`.
    #[default]
    Disambiguate,
    /// Later items overwrite earlier ones that share a natural key.
    LastWins,
}

// ---------------------------------------------------------------------------
// Evaluation options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime evaluation options, merged from config file and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Emit warning-severity issues.
    pub soft_checks: bool,
    /// Item key policy for per-item scores.
    pub item_key: ItemKeyPolicy,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EvaluationOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            soft_checks: config.evaluation.soft_checks,
            item_key: config.evaluation.item_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.salescope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SalescopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.salescope/salescope.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| SalescopeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SalescopeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SalescopeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SalescopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SalescopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("soft_checks"));
        assert!(toml_str.contains("disambiguate"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.evaluation.soft_checks);
        assert_eq!(parsed.evaluation.item_key, ItemKeyPolicy::Disambiguate);
        assert!(parsed.output.pretty);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[evaluation]
item_key = "last_wins"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.evaluation.item_key, ItemKeyPolicy::LastWins);
        assert!(config.evaluation.soft_checks);
        assert!(config.output.pretty);
    }

    #[test]
    fn unknown_item_key_policy_is_rejected() {
        let result: std::result::Result<AppConfig, _> =
            toml::from_str("[evaluation]\nitem_key = \"first_wins\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn evaluation_options_from_app_config() {
        let mut app = AppConfig::default();
        app.evaluation.soft_checks = false;
        let opts = EvaluationOptions::from(&app);
        assert!(!opts.soft_checks);
        assert_eq!(opts.item_key, ItemKeyPolicy::Disambiguate);
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("salescope-no-such-config.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, SalescopeError::Io { .. }));
    }
}
