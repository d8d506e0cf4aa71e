//! Text processing utilities.

/// Suffix appended to truncated snippets.
pub const ELLIPSIS: &str = "...";

/// Truncate `content` to `max_chars` characters, appending [`ELLIPSIS`] when
/// anything was cut. Content at or under the limit is returned unchanged.
pub fn truncate_snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &content[..byte_idx], ELLIPSIS),
        None => content.to_string(),
    }
}

/// Single-line preview for terminal output.
pub fn preview_line(content: &str, max_chars: usize) -> String {
    let flattened: String = content
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    truncate_snippet(flattened.trim(), max_chars)
}
