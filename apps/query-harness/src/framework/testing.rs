//! Regression testing of the catalog against the warehouse: executing each
//! query, summarising the outcomes, and feeding observed costs back into the
//! query headers.

pub mod executor;
pub mod report;
pub mod updater;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of testing one query. Pending queries are never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryStatus {
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "Empty Result")]
    EmptyResult,
    #[serde(rename = "Syntax Error")]
    SyntaxError,
    #[serde(rename = "Execution Error")]
    ExecutionError,
    #[serde(rename = "Pending Review")]
    PendingReview,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl QueryStatus {
    /// Evaluated top to bottom: a failed dry run outranks everything, and
    /// pending queries stop before execution.
    pub fn derive(
        dry_run_success: bool,
        is_pending: bool,
        execution_success: bool,
        row_count: u64,
    ) -> Self {
        if !dry_run_success {
            QueryStatus::SyntaxError
        } else if is_pending {
            QueryStatus::PendingReview
        } else if !execution_success {
            QueryStatus::ExecutionError
        } else if row_count == 0 {
            QueryStatus::EmptyResult
        } else {
            QueryStatus::Pass
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Pass => "Pass",
            QueryStatus::EmptyResult => "Empty Result",
            QueryStatus::SyntaxError => "Syntax Error",
            QueryStatus::ExecutionError => "Execution Error",
            QueryStatus::PendingReview => "Pending Review",
            QueryStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything learned about one query during a run. The field names are the
/// on-disk JSON layout read back by the header updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
    pub is_pending: bool,
    pub complexity: String,
    pub estimated_cost_header: String,
    pub dry_run_success: bool,
    pub dry_run_error: String,
    #[serde(default)]
    pub dry_run_bytes: u64,
    pub execution_success: bool,
    pub execution_error: String,
    pub row_count: u64,
    pub bytes_scanned: u64,
    pub estimated_cost_usd: f64,
    pub status: QueryStatus,
}

impl ExecutionResult {
    /// Non-pending queries that did not pass fail the run.
    pub fn is_failure(&self) -> bool {
        !self.is_pending && self.status != QueryStatus::Pass
    }
}
