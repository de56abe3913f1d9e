//! Runs each discovered query against a [`QueryService`]: a dry run first,
//! then, for non-pending queries that parsed, a bounded execution.
//!
//! Queries are processed one after another. Results come back as a fresh
//! `Vec` per call; no state is kept between runs.

use std::borrow::Cow;

use tracing::{info, warn};

use crate::framework::queries::cost::estimate_cost_usd;
use crate::framework::queries::QueryRecord;
use crate::framework::testing::{ExecutionResult, QueryStatus};
use crate::infrastructure::warehouse::QueryService;

/// Appends `LIMIT <limit>` on its own line unless the text already mentions
/// LIMIT in any case.
pub fn apply_row_limit(sql: &str, limit: u32) -> Cow<'_, str> {
    if sql.to_uppercase().contains("LIMIT") {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(format!("{sql}\nLIMIT {limit}"))
    }
}

pub struct QueryExecutor<'a, S: QueryService + ?Sized> {
    service: &'a S,
    row_limit: u32,
}

impl<'a, S: QueryService + ?Sized> QueryExecutor<'a, S> {
    pub fn new(service: &'a S, row_limit: u32) -> Self {
        Self { service, row_limit }
    }

    pub async fn test_query(&self, query: &QueryRecord) -> ExecutionResult {
        let (dry_run_success, dry_run_error, dry_run_bytes) =
            match self.service.dry_run(&query.content).await {
                Ok(bytes) => (true, String::new(), bytes),
                Err(e) => {
                    warn!("Dry run failed for {}: {}", query.name, e);
                    (false, e.to_string(), 0)
                }
            };

        let mut execution_success = false;
        let mut execution_error = String::new();
        let mut row_count = 0;
        let mut bytes_scanned = 0;

        if dry_run_success && !query.is_pending {
            let sql = apply_row_limit(&query.content, self.row_limit);
            match self.service.execute(&sql).await {
                Ok(stats) => {
                    execution_success = true;
                    row_count = stats.row_count;
                    bytes_scanned = stats.bytes_scanned;
                }
                Err(e) => {
                    warn!("Execution failed for {}: {}", query.name, e);
                    execution_error = e.to_string();
                }
            }
        }

        ExecutionResult {
            name: query.name.clone(),
            category: query.category.clone(),
            path: query.path.clone(),
            is_pending: query.is_pending,
            complexity: query.complexity.clone(),
            estimated_cost_header: query.recorded_cost.clone(),
            dry_run_success,
            dry_run_error,
            dry_run_bytes,
            execution_success,
            execution_error,
            row_count,
            bytes_scanned,
            estimated_cost_usd: estimate_cost_usd(bytes_scanned),
            status: QueryStatus::derive(
                dry_run_success,
                query.is_pending,
                execution_success,
                row_count,
            ),
        }
    }

    /// Tests every query in order, reporting each result to `on_result`
    /// along with its 1-based position and the total.
    pub async fn run_all<'q, I, F>(&self, queries: I, mut on_result: F) -> Vec<ExecutionResult>
    where
        I: IntoIterator<Item = &'q QueryRecord>,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(usize, usize, &ExecutionResult),
    {
        let queries = queries.into_iter();
        let total = queries.len();
        info!("Testing {} queries", total);

        let mut results = Vec::with_capacity(total);
        for (index, query) in queries.enumerate() {
            let result = self.test_query(query).await;
            on_result(index + 1, total, &result);
            results.push(result);
        }
        results
    }
}
