//! Terminal output helpers for the diagnostic commands.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Wrap `text` in `style` when `color` is set.
pub fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// A section heading, e.g. `== headers ==`.
pub fn heading(title: &str, color: bool) -> String {
    paint(&format!("== {title} =="), &format!("{BOLD}{DIM}"), color)
}
