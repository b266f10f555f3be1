//! Small string helpers.

/// Truncate to at most `max_chars` characters, appending an ellipsis when
/// anything was cut. Always respects char boundaries.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}
