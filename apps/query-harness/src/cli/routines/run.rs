//! The `run` subcommand: authenticate, test every query in the catalog and
//! write the report.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::cli::display::status::indicator_for;
use crate::cli::display::{show_lines, Message, MessageType};
use crate::cli::routines::{RoutineFailure, RoutineSuccess};
use crate::framework::queries::discovery::load_queries;
use crate::framework::testing::executor::QueryExecutor;
use crate::framework::testing::report::{render_markdown, write_document, write_json};
use crate::framework::testing::ExecutionResult;
use crate::infrastructure::warehouse::bigquery::BigQueryClient;
use crate::infrastructure::warehouse::credentials::resolve_credentials;
use crate::infrastructure::warehouse::{QueryService, WarehouseConfig};
use crate::utilities::constants::ENV_GCP_SA_KEY;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub query_dir: PathBuf,
    pub output: PathBuf,
    pub json_output: Option<PathBuf>,
    pub row_limit: u32,
}

pub async fn run_regression_tests(
    options: &RunOptions,
    credentials: Option<&str>,
    warehouse: WarehouseConfig,
) -> Result<RoutineSuccess, RoutineFailure> {
    let explicit = credentials
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_GCP_SA_KEY).ok());

    let resolved = resolve_credentials(explicit.as_deref()).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Auth".to_string(),
                "Could not load warehouse credentials".to_string(),
            ),
            e,
        )
    })?;
    let principal = resolved.credentials.principal().to_string();

    let client = BigQueryClient::connect(resolved, warehouse)
        .await
        .map_err(|e| {
            RoutineFailure::new(
                Message::new(
                    "Auth".to_string(),
                    format!("Failed to authenticate as {principal}"),
                ),
                e,
            )
        })?;

    show_message!(
        MessageType::Info,
        Message::new(
            "Authenticated".to_string(),
            format!("as {} on project {}", principal, client.project_id()),
        )
    );

    run_with_service(&client, options).await
}

/// Everything after authentication, against any warehouse.
pub async fn run_with_service<S: QueryService + ?Sized>(
    service: &S,
    options: &RunOptions,
) -> Result<RoutineSuccess, RoutineFailure> {
    let queries = load_queries(&options.query_dir).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Discovery".to_string(),
                format!("Failed to load queries from {}", options.query_dir.display()),
            ),
            e,
        )
    })?;

    show_message!(
        MessageType::Info,
        Message::new(
            "Loaded".to_string(),
            format!(
                "{} queries from {}",
                queries.len(),
                options.query_dir.display()
            ),
        )
    );

    let executor = QueryExecutor::new(service, options.row_limit);
    let results = executor
        .run_all(queries.values(), |index, total, result| {
            show_message!(
                MessageType::Info,
                Message::new(
                    "Testing".to_string(),
                    format!(
                        "[{index}/{total}] {} {} {}",
                        result.name,
                        indicator_for(result.status),
                        result.status
                    ),
                )
            );
        })
        .await;

    write_outputs(&results, &options.output, options.json_output.as_deref())?;
    summarize(&results)
}

fn write_outputs(
    results: &[ExecutionResult],
    output: &Path,
    json_output: Option<&Path>,
) -> Result<(), RoutineFailure> {
    let markdown = render_markdown(results, Local::now());
    write_document(output, &markdown).map_err(|e| {
        RoutineFailure::new(
            Message::new("Report".to_string(), "Failed to write the report".to_string()),
            e,
        )
    })?;
    show_message!(
        MessageType::Success,
        Message::new(
            "Wrote".to_string(),
            format!("test results to {}", output.display()),
        )
    );

    if let Some(json_output) = json_output {
        write_json(json_output, results).map_err(|e| {
            RoutineFailure::new(
                Message::new(
                    "Report".to_string(),
                    "Failed to write the JSON results".to_string(),
                ),
                e,
            )
        })?;
        show_message!(
            MessageType::Success,
            Message::new(
                "Wrote".to_string(),
                format!("JSON results to {}", json_output.display()),
            )
        );
    }

    Ok(())
}

fn summarize(results: &[ExecutionResult]) -> Result<RoutineSuccess, RoutineFailure> {
    let production = results.iter().filter(|r| !r.is_pending).count();
    let failures: Vec<&ExecutionResult> = results.iter().filter(|r| r.is_failure()).collect();

    info!(
        "Run finished: {} results, {} failures",
        results.len(),
        failures.len()
    );

    if failures.is_empty() {
        return Ok(RoutineSuccess::success(Message::new(
            "Passed".to_string(),
            format!("All {production} production queries passed!"),
        )));
    }

    show_lines(
        failures
            .iter()
            .map(|r| format!("   - {}: {}", r.name, r.status)),
    );
    Err(RoutineFailure::error(Message::new(
        "Failed".to_string(),
        format!("{} test(s) failed", failures.len()),
    )))
}
