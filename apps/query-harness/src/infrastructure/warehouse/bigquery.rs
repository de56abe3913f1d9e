//! BigQuery v2 REST client.
//!
//! Both calls go through `jobs.query`: the dry run sets `dryRun`, the real
//! execution asks for zero rows back (`maxResults=0`) since only the totals
//! matter, then polls `jobs.getQueryResults` until the job completes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::credentials::{ResolvedCredentials, TokenProvider};
use super::{ExecutionStats, QueryService, WarehouseConfig, WarehouseError};
use crate::utilities::constants::CLI_VERSION;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
    timeout_ms: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorProto {
    #[serde(default)]
    message: String,
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses.
/// Int64 counters arrive as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    job_reference: Option<JobReference>,
    #[serde(default)]
    total_rows: Option<String>,
    #[serde(default)]
    total_bytes_processed: Option<String>,
    #[serde(default)]
    errors: Option<Vec<ErrorProto>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    code: u16,
    message: String,
}

fn parse_counter(value: Option<&str>, field: &str) -> Result<u64, WarehouseError> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| WarehouseError::Decode(format!("{field} is not a count: {raw:?}"))),
    }
}

pub struct BigQueryClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    project_id: String,
    config: WarehouseConfig,
}

impl BigQueryClient {
    /// Builds a client and fetches its first access token, so bad
    /// credentials surface before any query runs.
    pub async fn connect(
        resolved: ResolvedCredentials,
        config: WarehouseConfig,
    ) -> Result<Self, WarehouseError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("query-harness/{CLI_VERSION}"))
            .build()?;
        let tokens = TokenProvider::new(
            http.clone(),
            resolved.credentials,
            config.token_uri.clone(),
        );
        tokens.access_token().await?;

        info!("Connected to BigQuery project {}", resolved.project_id);
        Ok(Self {
            http,
            tokens,
            project_id: resolved.project_id,
            config,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WarehouseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(ApiErrorBody { error }) => WarehouseError::Api {
                code: error.code,
                message: error.message,
            },
            Err(_) => WarehouseError::Api {
                code: status.as_u16(),
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or_default().to_string()
                } else {
                    body
                },
            },
        })
    }

    async fn submit(&self, request: &QueryRequest<'_>) -> Result<QueryResponse, WarehouseError> {
        let url = format!("{}/projects/{}/queries", self.base_url(), self.project_id);
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn poll(&self, job: &JobReference) -> Result<QueryResponse, WarehouseError> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.base_url(),
            job.project_id,
            job.job_id
        );
        let mut params = vec![
            ("maxResults", "0".to_string()),
            ("timeoutMs", self.config.poll_timeout_ms.to_string()),
        ];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }

        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;
        Self::decode(response).await
    }
}

fn job_failure(response: &QueryResponse) -> Option<WarehouseError> {
    let errors = response.errors.as_ref().filter(|errors| !errors.is_empty())?;
    if response.total_rows.is_some() {
        // Completed jobs may still list warnings
        return None;
    }
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    Some(WarehouseError::Job(messages.join("; ")))
}

#[async_trait]
impl QueryService for BigQueryClient {
    async fn dry_run(&self, sql: &str) -> Result<u64, WarehouseError> {
        debug!("Dry run: {}", sql);
        let response = self
            .submit(&QueryRequest {
                query: sql,
                use_legacy_sql: false,
                dry_run: true,
                max_results: None,
                timeout_ms: self.config.poll_timeout_ms,
            })
            .await?;

        parse_counter(
            response.total_bytes_processed.as_deref(),
            "totalBytesProcessed",
        )
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionStats, WarehouseError> {
        debug!("Executing: {}", sql);
        let mut response = self
            .submit(&QueryRequest {
                query: sql,
                use_legacy_sql: false,
                dry_run: false,
                max_results: Some(0),
                timeout_ms: self.config.poll_timeout_ms,
            })
            .await?;

        while !response.job_complete.unwrap_or(false) {
            let job = response.job_reference.as_ref().ok_or_else(|| {
                WarehouseError::Decode("incomplete job without a job reference".to_string())
            })?;
            debug!("Waiting for job {}", job.job_id);
            let next = self.poll(job).await?;
            response = QueryResponse {
                job_reference: next.job_reference.or(response.job_reference),
                ..next
            };
        }

        if let Some(failure) = job_failure(&response) {
            return Err(failure);
        }

        Ok(ExecutionStats {
            row_count: parse_counter(response.total_rows.as_deref(), "totalRows")?,
            bytes_scanned: parse_counter(
                response.total_bytes_processed.as_deref(),
                "totalBytesProcessed",
            )?,
        })
    }
}
