//! The `init` subcommand: writes the placeholder results document.

use std::path::Path;

use crate::cli::display::{Message, MessageType};
use crate::cli::routines::{RoutineFailure, RoutineSuccess};
use crate::framework::queries::discovery::discover_by_category;
use crate::framework::testing::report::{render_skeleton, write_document};

pub fn init_results(query_dir: &Path, output: &Path) -> Result<RoutineSuccess, RoutineFailure> {
    let by_category = discover_by_category(query_dir).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Discovery".to_string(),
                format!("Failed to discover queries in {}", query_dir.display()),
            ),
            e,
        )
    })?;

    let total: usize = by_category.values().map(Vec::len).sum();
    show_message!(
        MessageType::Info,
        Message::new(
            "Discovered".to_string(),
            format!("{total} queries in {} categories", by_category.len()),
        )
    );

    write_document(output, &render_skeleton(&by_category)).map_err(|e| {
        RoutineFailure::new(
            Message::new(
                "Init".to_string(),
                format!("Failed to write {}", output.display()),
            ),
            e,
        )
    })?;

    Ok(RoutineSuccess::success(Message::new(
        "Created".to_string(),
        output.display().to_string(),
    )))
}
