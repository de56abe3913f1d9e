//! # Routines
//!
//! A routine is what a subcommand runs: a function returning
//! `Result<RoutineSuccess, RoutineFailure>`. The entry point shows the
//! message carried by either side and turns it into the exit code, so
//! routines never exit the process themselves.
//!
//! Output that is not a single message (progress lines, per-file listings)
//! is printed by the routine as it goes.

use crate::cli::display::{Message, MessageType};

pub mod init;
pub mod run;
pub mod update_headers;
pub mod validate;

#[derive(Debug, Clone)]
pub struct RoutineSuccess {
    pub message: Message,
    pub message_type: MessageType,
}

impl RoutineSuccess {
    pub fn success(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Success,
        }
    }

    /// A success whose output was already printed; the entry point shows
    /// nothing further.
    pub fn silent() -> Self {
        Self {
            message: Message::new(String::new(), String::new()),
            message_type: MessageType::Info,
        }
    }
}

#[derive(Debug)]
pub struct RoutineFailure {
    pub message: Message,
    pub message_type: MessageType,
    pub error: Option<anyhow::Error>,
}

impl RoutineFailure {
    pub fn new<F: Into<anyhow::Error>>(message: Message, error: F) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: Some(error.into()),
        }
    }

    /// create a RoutineFailure error without an error
    pub fn error(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: None,
        }
    }
}
