//! Feeds observed scan costs back into query headers when they drift from
//! what the header records.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::framework::queries::cost::{estimate_cost_usd, format_bytes, format_cost};
use crate::framework::queries::header::{exceeds_variance_threshold, HeaderStats};
use crate::framework::testing::{ExecutionResult, QueryStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub name: String,
    pub was_updated: bool,
    pub message: String,
}

pub struct HeaderUpdater {
    variance_threshold: f64,
}

impl HeaderUpdater {
    pub fn new(variance_threshold: f64) -> Self {
        Self { variance_threshold }
    }

    /// Rewrites the stats line of `path` for a query that scanned
    /// `bytes_scanned` bytes. Returns whether the file changed and a message
    /// describing what happened; I/O failures are folded into the message.
    pub fn update_query_file(&self, path: &Path, bytes_scanned: u64) -> (bool, String) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return (false, format!("Error: {e}")),
        };

        match self.rewrite(&content, bytes_scanned) {
            Rewrite::WithinThreshold => (
                false,
                format!(
                    "No update needed (variance < {}%)",
                    percent(self.variance_threshold)
                ),
            ),
            Rewrite::PatternMissing => (false, "Could not find stats pattern in header".to_string()),
            Rewrite::Updated { content, message } => match fs::write(path, content) {
                Ok(()) => {
                    debug!("Rewrote header of {}", path.display());
                    (true, message)
                }
                Err(e) => (false, format!("Error: {e}")),
            },
        }
    }

    fn rewrite(&self, content: &str, bytes_scanned: u64) -> Rewrite {
        let current = HeaderStats::parse(content);
        let cost = estimate_cost_usd(bytes_scanned);

        if !exceeds_variance_threshold(&current.estimated_cost, cost, self.variance_threshold) {
            return Rewrite::WithinThreshold;
        }

        let fresh = HeaderStats {
            estimated_cost: format_cost(cost),
            bytes_scanned: format_bytes(bytes_scanned),
            complexity: current.complexity,
        };

        match fresh.rewrite_into(content) {
            Some(rewritten) if rewritten != content => Rewrite::Updated {
                content: rewritten,
                message: format!(
                    "Updated: {} (was {}), {} bytes",
                    fresh.estimated_cost, current.estimated_cost, fresh.bytes_scanned
                ),
            },
            _ => Rewrite::PatternMissing,
        }
    }

    /// Applies every passing, non-pending result. Paths that do not exist as
    /// recorded are looked up under `query_dir`.
    pub fn batch_update(&self, results: &[ExecutionResult], query_dir: &Path) -> Vec<UpdateOutcome> {
        let outcomes: Vec<UpdateOutcome> = results
            .iter()
            .filter(|r| !r.is_pending && r.status == QueryStatus::Pass)
            .map(|r| {
                let path = resolve_query_path(&r.path, query_dir);
                let (was_updated, message) = self.update_query_file(&path, r.bytes_scanned);
                UpdateOutcome {
                    name: r.name.clone(),
                    was_updated,
                    message,
                }
            })
            .collect();

        info!(
            "Header update: {} of {} changed",
            outcomes.iter().filter(|o| o.was_updated).count(),
            outcomes.len()
        );
        outcomes
    }
}

enum Rewrite {
    WithinThreshold,
    PatternMissing,
    Updated { content: String, message: String },
}

fn resolve_query_path(recorded: &Path, query_dir: &Path) -> PathBuf {
    if recorded.exists() || recorded.is_absolute() {
        return recorded.to_path_buf();
    }
    let joined = query_dir.join(recorded);
    if joined.exists() {
        joined
    } else {
        recorded.to_path_buf()
    }
}

/// `0.1` renders as `10`, `0.125` as `12.5`.
fn percent(threshold: f64) -> String {
    let formatted = format!("{:.2}", threshold * 100.0);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
