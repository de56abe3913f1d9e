//! # Warehouse
//!
//! The harness only needs two things from the data warehouse: a dry run that
//! validates a query and estimates the bytes it would scan, and a bounded
//! execution reporting rows returned and bytes actually scanned.
//! [`QueryService`] is that contract; [`bigquery::BigQueryClient`] is the
//! production implementation.

pub mod bigquery;
pub mod credentials;

use async_trait::async_trait;
use serde::Deserialize;

use crate::utilities::constants::{BIGQUERY_API_BASE_URL, DEFAULT_POLL_TIMEOUT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    pub row_count: u64,
    pub bytes_scanned: u64,
}

#[async_trait]
pub trait QueryService: Send + Sync {
    /// Validates `sql` without running it; returns the bytes it would scan.
    async fn dry_run(&self, sql: &str) -> Result<u64, WarehouseError>;

    /// Runs `sql` to completion.
    async fn execute(&self, sql: &str) -> Result<ExecutionStats, WarehouseError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error(
        "No credentials found: pass --credentials, set GCP_SA_KEY or GOOGLE_APPLICATION_CREDENTIALS"
    )]
    NoCredentials,

    #[error("Failed to read credentials from {}: {source}", path.display())]
    CredentialsIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Error payload returned by the warehouse API, message kept verbatim.
    #[error("{code} {message}")]
    Api { code: u16, message: String },

    #[error("{0}")]
    Job(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WarehouseConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Overrides the token endpoint named in the credentials file.
    #[serde(default)]
    pub token_uri: Option<String>,

    /// How long the service may hold each results poll open.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u32,
}

fn default_api_base_url() -> String {
    BIGQUERY_API_BASE_URL.to_string()
}

fn default_poll_timeout_ms() -> u32 {
    DEFAULT_POLL_TIMEOUT_MS
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token_uri: None,
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}
