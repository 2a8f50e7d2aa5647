//! Text helpers for log lines and message listings.

/// Longest prefix of `s` within `max_bytes` that ends on a char boundary
fn clip(s: &str, max_bytes: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// One-line preview of a prompt or answer.
///
/// Keeps the first line, cut to at most `max_bytes`, and appends "..."
/// whenever anything was left out.
pub fn preview(text: &str, max_bytes: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let short = clip(first_line, max_bytes);
    if short.len() < text.trim_end().len() {
        format!("{}...", short)
    } else {
        short.to_string()
    }
}
