use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::process::Command;

const TIB: u64 = 1 << 40;

fn result(name: &str, path: &str, status: &str, bytes_scanned: u64) -> serde_json::Value {
    json!({
        "name": name,
        "category": "basic",
        "path": path,
        "is_pending": false,
        "complexity": "Low",
        "estimated_cost_header": "TBD",
        "dry_run_success": true,
        "dry_run_error": "",
        "execution_success": status == "Pass",
        "execution_error": "",
        "row_count": 10,
        "bytes_scanned": bytes_scanned,
        "estimated_cost_usd": 0.0,
        "status": status,
    })
}

#[test]
fn update_headers_rewrites_stale_costs() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let stale = temp.child("queries/basic/stale.sql");
    stale.write_str(
        "-- Estimated Cost: TBD | Bytes Scanned: TBD | Complexity: Medium\nSELECT 1\n",
    )?;
    let fresh = temp.child("queries/basic/fresh.sql");
    let fresh_text = "-- Estimated Cost: $6.2500 | Bytes Scanned: 1.00TB | Complexity: Low\nSELECT 2\n";
    fresh.write_str(fresh_text)?;
    let failed = temp.child("queries/basic/failed.sql");
    let failed_text = "-- Estimated Cost: TBD | Bytes Scanned: TBD | Complexity: Low\nSELECT 3\n";
    failed.write_str(failed_text)?;

    let results = json!([
        result("stale", "queries/basic/stale.sql", "Pass", TIB),
        result("fresh", "queries/basic/fresh.sql", "Pass", TIB),
        result("failed", "queries/basic/failed.sql", "Execution Error", TIB),
    ]);
    temp.child("results.json")
        .write_str(&serde_json::to_string_pretty(&results)?)?;

    let mut cmd = Command::cargo_bin("query-harness")?;
    cmd.arg("update-headers")
        .arg("--results")
        .arg("results.json")
        .current_dir(temp.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Updated 1 of 2 queries"))
        .stdout(predicate::str::contains(
            "✓ stale: Updated: $6.2500 (was TBD), 1.00TB bytes",
        ));

    stale.assert(
        "-- Estimated Cost: $6.2500 | Bytes Scanned: 1.00TB | Complexity: Medium\nSELECT 1\n",
    );
    fresh.assert(fresh_text);
    failed.assert(failed_text);

    Ok(())
}

#[test]
fn update_headers_resolves_paths_against_query_dir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let query = temp.child("catalog/basic/count.sql");
    query.write_str("-- Estimated Cost: $100 | Bytes Scanned: 16TB | Complexity: High\nSELECT 1\n")?;

    let results = json!([result("count", "basic/count.sql", "Pass", TIB)]);
    temp.child("results.json")
        .write_str(&serde_json::to_string(&results)?)?;

    let mut cmd = Command::cargo_bin("query-harness")?;
    cmd.arg("update-headers")
        .arg("--results")
        .arg("results.json")
        .arg("--query-dir")
        .arg("catalog")
        .arg("--threshold")
        .arg("0.5")
        .current_dir(temp.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Updated 1 of 1 queries"));
    query.assert(predicate::str::starts_with(
        "-- Estimated Cost: $6.2500 | Bytes Scanned: 1.00TB | Complexity: High\n",
    ));

    Ok(())
}

#[test]
fn update_headers_fails_on_missing_results() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;

    let mut cmd = Command::cargo_bin("query-harness")?;
    cmd.arg("update-headers")
        .arg("--results")
        .arg("missing.json")
        .current_dir(temp.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Failed to load results"));

    Ok(())
}
