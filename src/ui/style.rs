use console::style;
use std::fmt::Display;

/// Cyan bold — the AI partner's name in chat lines.
pub fn ai_name<D: Display>(name: D) -> String {
    style(name).cyan().bold().to_string()
}

/// Yellow bold — chapter banners on the canvas.
pub fn chapter_banner<D: Display>(title: D) -> String {
    style(format!("— {title} —")).yellow().bold().to_string()
}

/// Dim — system notices and secondary hints.
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Green bold — confirmations (story saved, cover ready).
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// Yellow — warnings (partial publish, rejected input).
pub fn warn<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan bold — the input prompt marker.
pub fn prompt() -> String {
    style("› ").cyan().bold().to_string()
}
