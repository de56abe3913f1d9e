//! # Display
//!
//! Everything the harness prints for humans goes through here: one styled
//! action column followed by free text. Logs go through `tracing` instead.

pub mod message;
pub mod status;
pub mod terminal;

pub use message::{Message, MessageType};

use terminal::{write_styled_line, StyledText};

/// Shows a message, mirroring it into the log at a matching level.
macro_rules! show_message {
    ($message_type:expr, $message:expr) => {
        $crate::cli::display::show_message_wrapper($message_type, $message)
    };
}

pub fn show_message_wrapper(message_type: MessageType, message: Message) {
    match message_type {
        MessageType::Error => tracing::error!("{}: {}", message.action, message.details),
        MessageType::Warning => tracing::warn!("{}: {}", message.action, message.details),
        _ => tracing::debug!("{}: {}", message.action, message.details),
    }

    let styled = match message_type {
        MessageType::Info => StyledText::from_str(&message.action).cyan().bold(),
        MessageType::Success => StyledText::from_str(&message.action).green().bold(),
        MessageType::Warning => StyledText::from_str(&message.action).yellow().bold(),
        MessageType::Error => StyledText::from_str(&message.action).red().bold(),
    };

    let _ = write_styled_line(&styled, &message.details, terminal::ansi_disabled());
}

/// Prints free-form lines (report previews, per-file listings) without the
/// action column.
pub fn show_lines<I, S>(lines: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for line in lines {
        println!("{}", line.as_ref());
    }
}
