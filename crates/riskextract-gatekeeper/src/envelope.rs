//! Envelope handling for raw completions

/// Trim whitespace and a single surrounding markdown code fence
///
/// Handles ```` ```json ```` and bare ```` ``` ```` fences, on one line or
/// several. Text without a leading fence is only trimmed.
pub fn strip_envelope(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string (`json`, `JSON`, ...)
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}
