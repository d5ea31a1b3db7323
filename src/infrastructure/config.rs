//! Configuration file management.
//!
//! Handles loading and saving the TOML configuration: output root, logs
//! directory, and the default export option toggles applied when the CLI
//! flags leave them unset.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{AppError, ExportOptions, Result};

use super::paths::{default_data_dir, default_export_root, default_logs_dir};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# archivecord configuration
# Auto-generated - edit as needed

[output]
# Root directory for exported artifacts (optional, defaults to
# ~/.archivecord/exports)
# root = "/custom/exports"

[logs]
# Directory for per-run log files (optional, defaults to
# ~/.archivecord/logs)
# dir = "/custom/logs"

[defaults]
# Artifact kinds written unless overridden on the command line
json = false
formatted_text = true
attachments = false

# Transcript rendering toggles
include_edited_timestamp = true
include_pinned_marker = true
include_reply_reference = true
"#;

/// Output location configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for exports; `None` uses the platform default.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Run log configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Logs directory; `None` uses the platform default.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Default export option toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultOptions {
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_true")]
    pub formatted_text: bool,
    #[serde(default)]
    pub attachments: bool,
    #[serde(default = "default_true")]
    pub include_edited_timestamp: bool,
    #[serde(default = "default_true")]
    pub include_pinned_marker: bool,
    #[serde(default = "default_true")]
    pub include_reply_reference: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            json: false,
            formatted_text: true,
            attachments: false,
            include_edited_timestamp: true,
            include_pinned_marker: true,
            include_reply_reference: true,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output location.
    #[serde(default)]
    pub output: OutputConfig,

    /// Run log location.
    #[serde(default)]
    pub logs: LogsConfig,

    /// Default export option toggles.
    #[serde(default)]
    pub defaults: DefaultOptions,
}

impl AppConfig {
    /// Resolved output root.
    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        self.output.root.clone().unwrap_or_else(default_export_root)
    }

    /// Resolved logs directory.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.logs.dir.clone().unwrap_or_else(default_logs_dir)
    }

    /// Build the base [`ExportOptions`] snapshot from configured defaults.
    ///
    /// Filter bounds are always per-run and stay unset here.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            include_json: self.defaults.json,
            include_formatted_text: self.defaults.formatted_text,
            include_attachments: self.defaults.attachments,
            include_edited_timestamp: self.defaults.include_edited_timestamp,
            include_pinned_marker: self.defaults.include_pinned_marker,
            include_reply_reference: self.defaults.include_reply_reference,
            before_filter: None,
            after_filter: None,
            output_root: self.output_root(),
        }
    }
}

/// Get the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Load configuration from file or fall back to defaults.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = config_file_path();

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(&config_path, content)
        .map_err(|e| AppError::io(format!("Failed to write config file: {}", config_path.display()), e))?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create the default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if the file cannot be created.
pub fn ensure_config_exists() -> Result<()> {
    let config_path = config_file_path();

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config.defaults.formatted_text);
        assert!(!config.defaults.json);
        assert!(config.output.root.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.output.root = Some(PathBuf::from("/srv/exports"));
        config.defaults.attachments = true;

        let content = toml::to_string_pretty(&config).unwrap();
        fs::write(&config_path, content).unwrap();

        let loaded = load_config_from_file(&config_path).unwrap();
        assert_eq!(loaded.output_root(), PathBuf::from("/srv/exports"));
        assert!(loaded.defaults.attachments);
    }

    #[test]
    fn test_export_options_from_defaults() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let options = config.export_options();
        assert!(options.include_formatted_text);
        assert!(options.include_pinned_marker);
        assert!(options.before_filter.is_none());
        assert!(options.after_filter.is_none());
    }
}
