//! Status indicators used in per-file and per-query listings.

use crate::framework::testing::QueryStatus;

/// Success status indicator
pub const STATUS_SUCCESS: &str = "✓";

/// Warning status indicator
pub const STATUS_WARNING: &str = "⚠";

/// Error status indicator
pub const STATUS_ERROR: &str = "✗";

/// Formats a success status message
///
/// # Example
/// ```text
/// let msg = format_success("basic/count_patients.yaml", "No errors");
/// // Returns: "✓ basic/count_patients.yaml: No errors"
/// ```
pub fn format_success(item: &str, message: &str) -> String {
    format!("{} {}: {}", STATUS_SUCCESS, item, message)
}

/// Picks the indicator for a query's test status. Pending and empty results
/// are flagged as warnings rather than failures.
pub fn indicator_for(status: QueryStatus) -> &'static str {
    match status {
        QueryStatus::Pass => STATUS_SUCCESS,
        QueryStatus::PendingReview | QueryStatus::EmptyResult => STATUS_WARNING,
        QueryStatus::SyntaxError | QueryStatus::ExecutionError | QueryStatus::Unknown => {
            STATUS_ERROR
        }
    }
}
