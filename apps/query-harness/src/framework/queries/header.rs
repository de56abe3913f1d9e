//! # Query header statistics
//!
//! Query files may open with a comment line recording what the query costs to
//! run:
//!
//! ```sql
//! -- Estimated Cost: $0.0123 | Bytes Scanned: 1.97GB | Complexity: Low
//! SELECT ...
//! ```
//!
//! [`HeaderStats`] is the single owner of that layout. It parses the three
//! labelled values out of the first lines of a file and formats the
//! replacement line when fresher numbers are available.

use lazy_static::lazy_static;
use regex::Regex;

use crate::utilities::constants::{HEADER_SCAN_LINES, UNKNOWN_COMPLEXITY, UNSET_STAT};

/// Below this a recompute against a recorded zero cost is noise.
const ZERO_COST_FLOOR: f64 = 0.01;

lazy_static! {
    static ref COST_FIELD: Regex =
        Regex::new(r"Estimated Cost:\s*([^|]+)").expect("cost pattern is valid");
    static ref BYTES_FIELD: Regex =
        Regex::new(r"Bytes Scanned:\s*([^|]+)").expect("bytes pattern is valid");
    static ref COMPLEXITY_FIELD: Regex =
        Regex::new(r"Complexity:\s*([^|]+)").expect("complexity pattern is valid");
    static ref STATS_LINE: Regex = Regex::new(
        r"-- Estimated Cost:[^\n]*?\| Bytes Scanned:[^\n]*?\| Complexity:[^\n]*?\n"
    )
    .expect("stats line pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderStats {
    pub estimated_cost: String,
    pub bytes_scanned: String,
    pub complexity: String,
}

impl Default for HeaderStats {
    fn default() -> Self {
        Self {
            estimated_cost: UNSET_STAT.to_string(),
            bytes_scanned: UNSET_STAT.to_string(),
            complexity: UNKNOWN_COMPLEXITY.to_string(),
        }
    }
}

impl HeaderStats {
    /// Reads the labelled values from the leading lines of `content`. Each
    /// label keeps its first occurrence; missing labels keep their sentinel.
    pub fn parse(content: &str) -> Self {
        let mut cost = None;
        let mut bytes = None;
        let mut complexity = None;

        for line in content.lines().take(HEADER_SCAN_LINES) {
            cost = cost.or_else(|| capture_field(&COST_FIELD, line));
            bytes = bytes.or_else(|| capture_field(&BYTES_FIELD, line));
            complexity = complexity.or_else(|| capture_field(&COMPLEXITY_FIELD, line));
        }

        let defaults = Self::default();
        Self {
            estimated_cost: cost.unwrap_or(defaults.estimated_cost),
            bytes_scanned: bytes.unwrap_or(defaults.bytes_scanned),
            complexity: complexity.unwrap_or(defaults.complexity),
        }
    }

    pub fn to_header_line(&self) -> String {
        format!(
            "-- Estimated Cost: {} | Bytes Scanned: {} | Complexity: {}",
            self.estimated_cost, self.bytes_scanned, self.complexity
        )
    }

    /// Swaps the first stats line in `content` for this header. Returns
    /// `None` when the file carries no line in the three-field layout.
    pub fn rewrite_into(&self, content: &str) -> Option<String> {
        let found = STATS_LINE.find(content)?;
        let line_ending = if found.as_str().ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };

        let mut rewritten = String::with_capacity(content.len());
        rewritten.push_str(&content[..found.start()]);
        rewritten.push_str(&self.to_header_line());
        rewritten.push_str(line_ending);
        rewritten.push_str(&content[found.end()..]);
        Some(rewritten)
    }
}

fn capture_field(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().trim().to_string())
}

/// Decides whether a freshly computed cost differs enough from the recorded
/// one to rewrite the header.
///
/// Ranges such as `$0.10-0.25` are compared by their lower bound. Anything
/// that does not read as a number is treated as stale.
pub fn exceeds_variance_threshold(previous: &str, new_cost: f64, threshold: f64) -> bool {
    if previous == UNSET_STAT {
        return true;
    }

    let cleaned = previous.replace('$', "");
    let lower_bound = cleaned.split('-').next().unwrap_or_default().trim();

    match lower_bound.parse::<f64>() {
        Ok(old) if old == 0.0 => new_cost > ZERO_COST_FLOOR,
        Ok(old) => (new_cost - old).abs() / old > threshold,
        Err(_) => true,
    }
}
