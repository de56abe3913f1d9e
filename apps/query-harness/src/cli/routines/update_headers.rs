//! The `update-headers` subcommand.

use std::path::Path;

use crate::cli::display::status::format_success;
use crate::cli::display::{show_lines, Message, MessageType};
use crate::cli::routines::{RoutineFailure, RoutineSuccess};
use crate::framework::testing::report::read_json;
use crate::framework::testing::updater::HeaderUpdater;

pub fn update_headers(
    results_path: &Path,
    variance_threshold: f64,
    query_dir: &Path,
) -> Result<RoutineSuccess, RoutineFailure> {
    let results = read_json(results_path).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Headers".to_string(),
                format!("Failed to load results from {}", results_path.display()),
            ),
            e,
        )
    })?;

    let outcomes = HeaderUpdater::new(variance_threshold).batch_update(&results, query_dir);
    let updated: Vec<_> = outcomes.iter().filter(|o| o.was_updated).collect();

    show_message!(
        MessageType::Success,
        Message::new(
            "Updated".to_string(),
            format!("{} of {} queries", updated.len(), outcomes.len()),
        )
    );
    show_lines(
        updated
            .iter()
            .map(|o| format!("  {}", format_success(&o.name, &o.message))),
    );

    Ok(RoutineSuccess::silent())
}
