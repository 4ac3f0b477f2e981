//! Styling for messages printed outside the terminal display.

/// ANSI escape codes used for CLI output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Cyan color
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Formats a fatal error for stderr
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Formats the one-line startup banner shown when the display is off
pub fn format_banner(address: &str) -> String {
    format!(
        "{}{}Media Monitor{} listening on ws://{address}",
        Colors::BOLD,
        Colors::CYAN,
        Colors::RESET
    )
}
