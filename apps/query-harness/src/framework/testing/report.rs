//! Markdown and JSON renderings of a run, plus the results skeleton written
//! by `init` before the first run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use convert_case::{Case, Casing};
use tracing::debug;

use crate::framework::queries::cost::{format_bytes, format_cost};
use crate::framework::testing::{ExecutionResult, QueryStatus};

/// Error cells keep this many characters before the ellipsis.
const ERROR_CELL_WIDTH: usize = 30;
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid results document: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn render_markdown(results: &[ExecutionResult], generated_at: DateTime<Local>) -> String {
    let count = |status: QueryStatus| results.iter().filter(|r| r.status == status).count();

    let mut lines = vec![
        "# Query Regression Test Results".to_string(),
        format!("\n**Generated:** {}", generated_at.to_rfc3339()),
        format!("**Total Queries:** {}", results.len()),
        format!("**Pass:** {}", count(QueryStatus::Pass)),
        format!("**Pending Review:** {}", count(QueryStatus::PendingReview)),
        format!("**Syntax Errors:** {}", count(QueryStatus::SyntaxError)),
        format!("**Execution Errors:** {}", count(QueryStatus::ExecutionError)),
        format!("**Empty Results:** {}", count(QueryStatus::EmptyResult)),
        "\n## Results by Query\n".to_string(),
        "| Query | Category | Complexity | Status | Rows | Bytes | Cost USD | Dry Run Error | Exec Error |"
            .to_string(),
        "|-------|----------|------------|--------|------|-------|----------|---------------|-----------|"
            .to_string(),
    ];

    let mut sorted: Vec<&ExecutionResult> = results.iter().collect();
    sorted.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));

    for r in sorted {
        let rows = if r.row_count > 0 {
            r.row_count.to_string()
        } else {
            NOT_AVAILABLE.to_string()
        };
        let bytes = if r.bytes_scanned > 0 {
            format_bytes(r.bytes_scanned)
        } else {
            NOT_AVAILABLE.to_string()
        };
        let cost = if r.estimated_cost_usd > 0.0 {
            format_cost(r.estimated_cost_usd)
        } else {
            NOT_AVAILABLE.to_string()
        };

        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            r.name,
            r.category,
            r.complexity,
            r.status,
            rows,
            bytes,
            cost,
            error_cell(&r.dry_run_error),
            error_cell(&r.execution_error),
        ));
    }

    lines.join("\n")
}

/// Truncates to the cell width and neutralises characters that would break
/// the table row.
fn error_cell(error: &str) -> String {
    let mut cell: String = error.chars().take(ERROR_CELL_WIDTH).collect();
    if error.chars().count() > ERROR_CELL_WIDTH {
        cell.push_str("...");
    }
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Placeholder document listing every query by category, rewritten by the
/// first real run.
pub fn render_skeleton(queries_by_category: &BTreeMap<String, Vec<String>>) -> String {
    let mut lines = vec![
        "# Query Test Results\n".to_string(),
        "## Status Summary".to_string(),
        "| Category | Total | Pass | Pending | Errors | Empty |".to_string(),
        "|----------|-------|------|---------|--------|-------|".to_string(),
    ];

    for category in queries_by_category.keys() {
        lines.push(format!("| {category} | - | - | - | - | - |"));
    }

    lines.push("\n## Results by Category\n".to_string());

    for (category, names) in queries_by_category {
        lines.push(format!("### {}\n", category.to_case(Case::Title)));
        lines.push("| Query | Complexity | Status | Rows | Bytes | Cost USD | Last Run |".to_string());
        lines.push("|-------|------------|--------|------|-------|----------|----------|".to_string());

        let mut names = names.clone();
        names.sort();
        for name in names {
            lines.push(format!("| {name} | - | - | - | - | - | - |"));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Writes `contents` to `path`, creating missing parent directories.
pub fn write_document(path: &Path, contents: &str) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn write_json(path: &Path, results: &[ExecutionResult]) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(results)?;
    write_document(path, &json)
}

pub fn read_json(path: &Path) -> Result<Vec<ExecutionResult>, ReportError> {
    let contents = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn result(name: &str, category: &str, status: QueryStatus) -> ExecutionResult {
        ExecutionResult {
            name: name.to_string(),
            category: category.to_string(),
            path: PathBuf::from(format!("queries/{category}/{name}.sql")),
            is_pending: category == "pending",
            complexity: "Low".to_string(),
            estimated_cost_header: "TBD".to_string(),
            dry_run_success: status != QueryStatus::SyntaxError,
            dry_run_error: String::new(),
            dry_run_bytes: 0,
            execution_success: matches!(status, QueryStatus::Pass | QueryStatus::EmptyResult),
            execution_error: String::new(),
            row_count: 0,
            bytes_scanned: 0,
            estimated_cost_usd: 0.0,
            status,
        }
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_and_sorted_rows() {
        let mut passing = result("zeta", "basic", QueryStatus::Pass);
        passing.row_count = 12;
        passing.bytes_scanned = 2048;
        passing.estimated_cost_usd = 0.0123;
        let results = vec![
            passing,
            result("alpha", "basic", QueryStatus::EmptyResult),
            result("draft", "pending", QueryStatus::PendingReview),
            result("broken", "advanced", QueryStatus::SyntaxError),
        ];

        let markdown = render_markdown(&results, generated_at());
        let lines: Vec<&str> = markdown.lines().collect();

        assert_eq!(lines[0], "# Query Regression Test Results");
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("**Generated:** 2026-03-01T12:00:00"));
        assert!(markdown.contains("**Total Queries:** 4"));
        assert!(markdown.contains("**Pass:** 1"));
        assert!(markdown.contains("**Pending Review:** 1"));
        assert!(markdown.contains("**Syntax Errors:** 1"));
        assert!(markdown.contains("**Execution Errors:** 0"));
        assert!(markdown.contains("**Empty Results:** 1"));

        let rows: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.starts_with("| ") && !l.starts_with("| Query"))
            .collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("| broken | advanced |"));
        assert!(rows[1].starts_with("| alpha | basic |"));
        assert_eq!(
            rows[2],
            "| zeta | basic | Low | Pass | 12 | 2.00KB | $0.0123 |  |  |"
        );
        assert!(rows[3].starts_with("| draft | pending |"));
    }

    #[test]
    fn test_zero_values_render_not_available() {
        let markdown = render_markdown(
            &[result("alpha", "basic", QueryStatus::EmptyResult)],
            generated_at(),
        );
        assert!(markdown.ends_with("| alpha | basic | Low | Empty Result | N/A | N/A | N/A |  |  |"));
    }

    #[test]
    fn test_error_cells_are_truncated_and_escaped() {
        assert_eq!(error_cell("short"), "short");
        assert_eq!(error_cell(&"x".repeat(30)), "x".repeat(30));
        assert_eq!(
            error_cell("400 Syntax error: Unexpected keyword FROM"),
            "400 Syntax error: Unexpected k..."
        );
        assert_eq!(error_cell("a|b\nc"), "a\\|b c");
    }

    #[test]
    fn test_skeleton_layout() {
        let mut by_category = BTreeMap::new();
        by_category.insert(
            "data_quality".to_string(),
            vec!["nulls".to_string(), "dupes".to_string()],
        );
        by_category.insert("basic".to_string(), vec!["count".to_string()]);

        let markdown = render_skeleton(&by_category);

        let expected = "\
# Query Test Results

## Status Summary
| Category | Total | Pass | Pending | Errors | Empty |
|----------|-------|------|---------|--------|-------|
| basic | - | - | - | - | - |
| data_quality | - | - | - | - | - |

## Results by Category

### Basic

| Query | Complexity | Status | Rows | Bytes | Cost USD | Last Run |
|-------|------------|--------|------|-------|----------|----------|
| count | - | - | - | - | - | - |

### Data Quality

| Query | Complexity | Status | Rows | Bytes | Cost USD | Last Run |
|-------|------------|--------|------|-------|----------|----------|
| dupes | - | - | - | - | - | - |
| nulls | - | - | - | - | - | - |
";
        assert_eq!(markdown, expected);
    }

    #[test]
    fn test_json_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/results.json");
        let results = vec![result("alpha", "basic", QueryStatus::Pass)];

        write_json(&path, &results).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["status"], "Pass");
        assert_eq!(raw[0]["path"], "queries/basic/alpha.sql");

        assert_eq!(read_json(&path).unwrap(), results);
    }

    #[test]
    fn test_read_json_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_json(&path), Err(ReportError::Json(_))));
        assert!(matches!(
            read_json(&dir.path().join("missing.json")),
            Err(ReportError::Read { .. })
        ));
    }
}
