//! # Logger Module
//!
//! Logging is built on `tracing-subscriber` layers:
//! - **EnvFilter Layer**: `RUST_LOG` wins over the configured level
//! - **Format Layer**: one line per event in the legacy layout
//!
//! ## Formats
//! - Text: `[timestamp LEVEL - target] message`
//! - JSON: `{"timestamp": "...", "severity": "INFO", "target": "...", "message": "..."}`
//!
//! ## Destinations
//! Events go to stderr by default so that report text printed on stdout stays
//! clean. `stdout = true` switches to stdout, and `log_file` appends to a file
//! instead of either stream.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: standard filtering (e.g. `RUST_LOG=query_harness::infrastructure=debug`)
//! - `QUERY_HARNESS_LOGGER__LEVEL`: DEBUG, INFO, WARN or ERROR
//! - `QUERY_HARNESS_LOGGER__FORMAT`: Text or Json
//! - `QUERY_HARNESS_LOGGER__STDOUT`: log to stdout instead of stderr
//! - `QUERY_HARNESS_LOGGER__LOG_FILE`: append to this file instead
//!
//! Use the `tracing::` macros to write logs.

use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerLevel {
    #[serde(alias = "DEBUG", alias = "debug")]
    Debug,
    #[serde(alias = "INFO", alias = "info")]
    Info,
    #[serde(alias = "WARN", alias = "warn")]
    Warn,
    #[serde(alias = "ERROR", alias = "error")]
    Error,
}

impl LoggerLevel {
    pub fn to_tracing_level(&self) -> LevelFilter {
        match self {
            LoggerLevel::Debug => LevelFilter::DEBUG,
            LoggerLevel::Info => LevelFilter::INFO,
            LoggerLevel::Warn => LevelFilter::WARN,
            LoggerLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(alias = "json", alias = "JSON")]
    Json,
    #[serde(alias = "text", alias = "TEXT")]
    Text,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: LoggerLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub stdout: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> LoggerLevel {
    LoggerLevel::Warn
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            level: default_log_level(),
            format: default_log_format(),
            stdout: false,
            log_file: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoggerError {
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install the log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

struct LegacyFormatLayer<W> {
    writer: W,
    format: LogFormat,
}

impl<W> LegacyFormatLayer<W> {
    fn new(writer: W, format: LogFormat) -> Self {
        Self { writer, format }
    }

    fn format_text(&self, level: &Level, target: &str, message: &str) -> String {
        format!(
            "[{} {} - {}] {}",
            humantime::format_rfc3339_seconds(SystemTime::now()),
            level,
            target,
            message
        )
    }

    fn format_json(&self, level: &Level, target: &str, message: &str) -> String {
        let log_json = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "severity": level.to_string(),
            "target": target,
            "message": message,
        });

        serde_json::to_string(&log_json)
            .expect("formatting `serde_json::Value` with string keys never fails")
    }
}

impl<S, W> Layer<S> for LegacyFormatLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = metadata.level();
        let target = metadata.target();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message;

        let output = match self.format {
            LogFormat::Text => self.format_text(level, target, &message),
            LogFormat::Json => self.format_json(level, target, &message),
        };

        let mut writer = self.writer.make_writer();
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.write_all(b"\n");
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
            if self.message.starts_with('"') && self.message.ends_with('"') {
                self.message = self.message[1..self.message.len() - 1].to_string();
            }
        }
    }
}

pub fn setup_logging(settings: &LoggerSettings) -> Result<(), LoggerError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_tracing_level().to_string()));

    if let Some(path) = &settings.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggerError::LogFile {
                path: path.clone(),
                source,
            })?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(LegacyFormatLayer::new(Mutex::new(file), settings.format))
            .try_init()?;
    } else if settings.stdout {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(LegacyFormatLayer::new(std::io::stdout, settings.format))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(LegacyFormatLayer::new(std::io::stderr, settings.format))
            .try_init()?;
    }

    Ok(())
}
