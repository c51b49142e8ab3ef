//! Helpers for sanitizing data before it enters tracing spans or job
//! error strings.
//!
//! Job records are readable by anyone holding a job id, so full paths and
//! unbounded tool output stay out of them.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Keeps at most the last `max_chars` characters of `text`, trimmed.
///
/// Tool diagnostics put the useful line at the end.
pub fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    let skip = count - max_chars;
    let rest: String = trimmed.chars().skip(skip).collect();
    format!("...{}", rest)
}

/// Keeps at most the first `max_chars` characters of `text`, trimmed.
pub fn head(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let kept: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", kept)
}
