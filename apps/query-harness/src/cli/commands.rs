//! # CLI Commands
//! A module for all the commands that can be run from the CLI

use std::path::PathBuf;

use clap::Subcommand;

use crate::utilities::constants::{DEFAULT_QUERY_DIR, DEFAULT_RESULTS_MARKDOWN};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dry-runs and executes every query, then writes a results report
    Run {
        /// Directory containing query files
        #[arg(long, default_value = DEFAULT_QUERY_DIR)]
        query_dir: PathBuf,

        /// Markdown report destination
        #[arg(long, default_value = DEFAULT_RESULTS_MARKDOWN)]
        output: PathBuf,

        /// Service account key file, or the key JSON itself (falls back to GCP_SA_KEY)
        #[arg(long)]
        credentials: Option<String>,

        /// Also write the results as JSON
        #[arg(long)]
        json_output: Option<PathBuf>,

        /// Row limit appended to queries without a LIMIT clause
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Rewrites query header stats from a JSON results document
    UpdateHeaders {
        /// JSON document written by `run --json-output`
        #[arg(long)]
        results: PathBuf,

        /// Relative cost change that triggers a rewrite (0.10 = 10%)
        #[arg(long)]
        threshold: Option<f64>,

        /// Directory the recorded query paths are resolved against
        #[arg(long, default_value = DEFAULT_QUERY_DIR)]
        query_dir: PathBuf,
    },
    /// Checks query metadata documents against the metadata schema
    Validate {
        /// Metadata files, or directories searched for *.yaml and *.yml
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Writes an empty results document listing every query
    Init {
        /// Directory containing query files
        #[arg(long, default_value = DEFAULT_QUERY_DIR)]
        query_dir: PathBuf,

        /// Markdown skeleton destination
        #[arg(long, default_value = DEFAULT_RESULTS_MARKDOWN)]
        output: PathBuf,
    },
}
