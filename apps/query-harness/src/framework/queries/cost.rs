//! Scan-cost arithmetic shared by the executor, the report and the header
//! updater. All three must agree, so nothing else computes a cost.

use crate::utilities::constants::{BYTES_PER_TIB, USD_PER_TIB};

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Monetary estimate for scanning `bytes_scanned` bytes at the flat
/// per-tebibyte rate.
pub fn estimate_cost_usd(bytes_scanned: u64) -> f64 {
    (bytes_scanned as f64 / BYTES_PER_TIB) * USD_PER_TIB
}

/// Human-readable size with two decimals, using 1024-based steps and falling
/// through to PB for anything past the TB range.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in BYTE_UNITS {
        if value < 1024.0 {
            return format!("{value:.2}{unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2}PB")
}

pub fn format_cost(cost_usd: f64) -> String {
    format!("${cost_usd:.4}")
}
