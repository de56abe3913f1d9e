#[macro_use]
pub(crate) mod display;

mod commands;
pub mod logger;
pub mod routines;
pub mod settings;

use clap::Parser;
use tracing::info;

use commands::Commands;
use routines::run::{run_regression_tests, RunOptions};
use routines::{RoutineFailure, RoutineSuccess};
use settings::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None, arg_required_else_help(true), next_display_order = None)]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Print backtraces for all errors (same as RUST_LIB_BACKTRACE=1)
    #[arg(
        long,
        global = true,
        help = "Print backtraces for all errors (same as RUST_LIB_BACKTRACE=1)"
    )]
    pub backtrace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

pub async fn top_command_handler(
    settings: Settings,
    commands: &Commands,
) -> Result<RoutineSuccess, RoutineFailure> {
    match commands {
        Commands::Run {
            query_dir,
            output,
            credentials,
            json_output,
            limit,
        } => {
            let options = RunOptions {
                query_dir: query_dir.clone(),
                output: output.clone(),
                json_output: json_output.clone(),
                row_limit: limit.unwrap_or(settings.runner.row_limit),
            };
            info!("Running regression tests with {:?}", options);

            run_regression_tests(&options, credentials.as_deref(), settings.warehouse).await
        }
        Commands::UpdateHeaders {
            results,
            threshold,
            query_dir,
        } => {
            let threshold = threshold.unwrap_or(settings.headers.variance_threshold);
            info!(
                "Updating headers from {} with threshold {}",
                results.display(),
                threshold
            );

            routines::update_headers::update_headers(results, threshold, query_dir)
        }
        Commands::Validate { paths } => {
            info!("Validating {} path(s)", paths.len());
            routines::validate::validate_metadata(paths)
        }
        Commands::Init { query_dir, output } => {
            info!(
                "Initializing {} from {}",
                output.display(),
                query_dir.display()
            );
            routines::init::init_results(query_dir, output)
        }
    }
}
