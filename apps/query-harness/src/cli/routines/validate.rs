//! The `validate` subcommand: checks metadata documents and lists every
//! problem found, file by file.

use std::path::PathBuf;

use crate::cli::display::status::{STATUS_ERROR, STATUS_SUCCESS, STATUS_WARNING};
use crate::cli::display::{show_lines, Message, MessageType};
use crate::cli::routines::{RoutineFailure, RoutineSuccess};
use crate::framework::queries::metadata::{metadata_files, validate_file, ValidationReport};

pub fn validate_metadata(paths: &[PathBuf]) -> Result<RoutineSuccess, RoutineFailure> {
    let files = metadata_files(paths);
    if files.is_empty() {
        return Err(RoutineFailure::error(Message::new(
            "Validate".to_string(),
            "No YAML files found to validate".to_string(),
        )));
    }

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        show_message!(
            MessageType::Info,
            Message::new("Validating".to_string(), file.display().to_string())
        );

        let report = validate_file(file);
        total_errors += report.errors.len();
        total_warnings += report.warnings.len();
        show_lines(report_lines(&report));
    }

    show_lines([
        String::new(),
        "=".repeat(60),
        format!("Validated {} file(s)", files.len()),
        format!("Total errors: {total_errors}"),
        format!("Total warnings: {total_warnings}"),
    ]);

    if total_errors > 0 {
        return Err(RoutineFailure::error(Message::new(
            "Invalid".to_string(),
            format!("{total_errors} error(s) across {} file(s)", files.len()),
        )));
    }

    Ok(RoutineSuccess::success(Message::new(
        "Valid".to_string(),
        "All files are valid!".to_string(),
    )))
}

fn report_lines(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.is_valid() {
        lines.push(format!("  {STATUS_SUCCESS} No errors"));
    } else {
        lines.push(format!("  {STATUS_ERROR} {} error(s):", report.errors.len()));
        lines.extend(report.errors.iter().map(|e| format!("    - {e}")));
    }

    if !report.warnings.is_empty() {
        lines.push(format!(
            "  {STATUS_WARNING} {} warning(s):",
            report.warnings.len()
        ));
        lines.extend(report.warnings.iter().map(|w| format!("    - {w}")));
    }

    lines
}
