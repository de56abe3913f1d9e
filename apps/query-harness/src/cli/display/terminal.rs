//! Styled terminal output.
//!
//! Actions are printed right-aligned in a fixed-width column so a long run of
//! per-query lines stays readable. Styling is dropped when stdout is not a
//! terminal or `NO_COLOR` is set, which keeps CI logs and piped output clean.

use crossterm::{
    execute,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor,
    },
    tty::IsTty,
};
use std::io::{stdout, Result as IoResult};

/// Width of the action column in terminal output
pub const ACTION_WIDTH: usize = 15;

/// Whether ANSI styling should be skipped for stdout.
pub fn ansi_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some() || !stdout().is_tty()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    text: String,
    foreground: Option<Color>,
    bold: bool,
}

impl StyledText {
    pub fn new(text: String) -> Self {
        Self {
            text,
            foreground: None,
            bold: false,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self::new(text.to_string())
    }

    pub fn cyan(mut self) -> Self {
        self.foreground = Some(Color::Cyan);
        self
    }

    pub fn green(mut self) -> Self {
        self.foreground = Some(Color::Green);
        self
    }

    pub fn yellow(mut self) -> Self {
        self.foreground = Some(Color::Yellow);
        self
    }

    pub fn red(mut self) -> Self {
        self.foreground = Some(Color::Red);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Writes `[ACTION (right-aligned)] message` to any writer so output can be
/// captured in tests.
fn write_styled_line_to<W: std::io::Write>(
    writer: &mut W,
    styled_text: &StyledText,
    message: &str,
    no_ansi: bool,
) -> IoResult<()> {
    // Character-aware truncation, multi-byte actions must not panic
    let action: String = styled_text.text.chars().take(ACTION_WIDTH).collect();
    let padded_action = format!("{action:>ACTION_WIDTH$}");

    if !no_ansi {
        if let Some(color) = styled_text.foreground {
            execute!(writer, SetForegroundColor(color))?;
        }
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Bold))?;
        }
    }

    execute!(writer, Print(&padded_action))?;

    if !no_ansi {
        execute!(writer, ResetColor)?;
        if styled_text.bold {
            execute!(writer, SetAttribute(Attribute::Reset))?;
        }
    }

    execute!(writer, Print(" "), Print(message), Print("\n"))?;

    Ok(())
}

pub fn write_styled_line(styled_text: &StyledText, message: &str, no_ansi: bool) -> IoResult<()> {
    let mut stdout = stdout();
    write_styled_line_to(&mut stdout, styled_text, message, no_ansi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(styled: &StyledText, message: &str, no_ansi: bool) -> String {
        let mut buffer = Vec::new();
        write_styled_line_to(&mut buffer, styled, message, no_ansi).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_action_is_right_aligned() {
        let output = render(&StyledText::from_str("Pass"), "count_patients", true);
        assert_eq!(output, "           Pass count_patients\n");
    }

    #[test]
    fn test_long_action_is_truncated() {
        let output = render(
            &StyledText::from_str("Execution Error Details"),
            "q",
            true,
        );
        assert!(output.starts_with("Execution Error q"));
    }

    #[test]
    fn test_multibyte_action_does_not_panic() {
        let output = render(&StyledText::from_str("✓✓✓✓✓✓✓✓✓✓✓✓✓✓✓✓✓✓"), "ok", true);
        assert!(output.ends_with(" ok\n"));
    }

    #[test]
    fn test_ansi_codes_present_when_enabled() {
        let output = render(&StyledText::from_str("Test").green().bold(), "msg", false);
        assert!(output.contains("\x1b["));
        assert!(output.contains("\x1b[1m"));
    }

    #[test]
    fn test_no_ansi_codes_when_disabled() {
        let cases = vec![
            StyledText::from_str("Cyan").cyan(),
            StyledText::from_str("Yellow").yellow(),
            StyledText::from_str("Red").red(),
            StyledText::from_str("Green").green().bold(),
        ];
        for styled in cases {
            let output = render(&styled, "message", true);
            assert!(!output.contains("\x1b["), "unexpected escape in {output:?}");
            assert!(output.contains("message"));
        }
    }
}
