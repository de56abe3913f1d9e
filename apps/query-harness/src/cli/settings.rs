//! # Settings
//!
//! Settings are layered: built-in defaults, then an optional
//! `query-harness.toml` in the working directory, then environment variables
//! prefixed with `QUERY_HARNESS_` where `__` separates nested keys.
//!
//! ```toml
//! [logger]
//! level = "Info"
//! format = "Json"
//!
//! [runner]
//! row_limit = 500
//!
//! [warehouse]
//! poll_timeout_ms = 20000
//!
//! [headers]
//! variance_threshold = 0.2
//! ```
//!
//! Command-line flags override whatever these layers produce.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::cli::logger::LoggerSettings;
use crate::infrastructure::warehouse::WarehouseConfig;
use crate::utilities::constants::{
    DEFAULT_ROW_LIMIT, DEFAULT_VARIANCE_THRESHOLD, ENV_SETTINGS_PREFIX, SETTINGS_FILE,
};

#[derive(Debug, thiserror::Error)]
#[error("Failed to load settings: {0}")]
pub struct SettingsError(#[from] config::ConfigError);

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
}

fn default_row_limit() -> u32 {
    DEFAULT_ROW_LIMIT
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HeaderSettings {
    #[serde(default = "default_variance_threshold")]
    pub variance_threshold: f64,
}

fn default_variance_threshold() -> f64 {
    DEFAULT_VARIANCE_THRESHOLD
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            variance_threshold: default_variance_threshold(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub logger: LoggerSettings,
    #[serde(default)]
    pub runner: RunnerSettings,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub headers: HeaderSettings,
}

/// Reads settings for a process started in `directory`.
pub fn read_settings(directory: &Path) -> Result<Settings, SettingsError> {
    let settings_file = directory.join(SETTINGS_FILE);

    let settings = Config::builder()
        .add_source(File::from(settings_file).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_SETTINGS_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::logger::{LogFormat, LoggerLevel};
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial(env)]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = read_settings(dir.path()).unwrap();

        assert_eq!(settings.runner.row_limit, 1000);
        assert_eq!(settings.headers.variance_threshold, 0.10);
        assert_eq!(settings.logger.level, LoggerLevel::Warn);
        assert_eq!(settings.warehouse, WarehouseConfig::default());
    }

    #[test]
    #[serial(env)]
    fn test_file_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[logger]\nlevel = \"debug\"\nformat = \"Json\"\n\n[runner]\nrow_limit = 25\n\n[headers]\nvariance_threshold = 0.25\n",
        )
        .unwrap();

        let settings = read_settings(dir.path()).unwrap();

        assert_eq!(settings.logger.level, LoggerLevel::Debug);
        assert_eq!(settings.logger.format, LogFormat::Json);
        assert_eq!(settings.runner.row_limit, 25);
        assert_eq!(settings.headers.variance_threshold, 0.25);
    }

    #[test]
    #[serial(env)]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[runner]\nrow_limit = 25\n").unwrap();

        std::env::set_var("QUERY_HARNESS_RUNNER__ROW_LIMIT", "7");
        let settings = read_settings(dir.path());
        std::env::remove_var("QUERY_HARNESS_RUNNER__ROW_LIMIT");

        assert_eq!(settings.unwrap().runner.row_limit, 7);
    }

    #[test]
    #[serial(env)]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[runner\nrow_limit = ").unwrap();

        assert!(read_settings(dir.path()).is_err());
    }
}
