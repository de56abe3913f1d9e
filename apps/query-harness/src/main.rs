#[macro_use]
mod cli;
pub mod framework;
pub mod infrastructure;
pub mod utilities;

use std::process::ExitCode;

use clap::Parser;
use cli::display::{Message, MessageType};
use cli::logger::LoggerLevel;

// Entry point for the CLI application
fn main() -> ExitCode {
    let current_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message::new(
                    "Init".to_string(),
                    format!("Failed to read the working directory: {e}"),
                )
            );
            return ExitCode::from(1);
        }
    };

    utilities::dotenv::load_dotenv_files(&current_dir);

    let mut settings = match cli::settings::read_settings(&current_dir) {
        Ok(settings) => settings,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message::new("Settings".to_string(), e.to_string())
            );
            return ExitCode::from(1);
        }
    };

    // Usage errors, --help and --version exit through clap
    let cli_result = cli::Cli::parse();

    if cli_result.backtrace {
        // Safe: no other threads have started and no errors have been created yet.
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }
    if cli_result.debug {
        settings.logger.level = LoggerLevel::Debug;
    }

    if let Err(e) = cli::logger::setup_logging(&settings.logger) {
        show_message!(
            MessageType::Warning,
            Message::new("Logging".to_string(), e.to_string())
        );
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message::new(
                    "Init".to_string(),
                    format!("Failed to start the async runtime: {e}"),
                )
            );
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(cli::top_command_handler(settings, &cli_result.command));

    match result {
        Ok(s) => {
            // Routines that already printed their output return an empty message
            if !s.message.action.is_empty() || !s.message.details.is_empty() {
                show_message!(s.message_type, s.message);
            }
            ExitCode::from(0)
        }
        Err(e) => {
            show_message!(e.message_type, e.message);
            if let Some(err) = e.error {
                eprintln!("{err:?}");
            }
            ExitCode::from(1)
        }
    }
}
