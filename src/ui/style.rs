use console::style;
use std::fmt::Display;

/// Green bold: success checkmarks, confirmations
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// Red bold: failures
pub fn danger<D: Display>(text: D) -> String {
    style(text).red().bold().to_string()
}

/// Yellow: warnings
pub fn yellow<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// White bold: section headers, titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: secondary text
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Cyan: field labels, info messages
pub fn cyan<D: Display>(text: D) -> String {
    style(text).cyan().to_string()
}

/// Green: approved badges, confirmed values
pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}
