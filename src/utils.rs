/// Extract JSON content from an LLM response.
///
/// Handles three formats:
/// 1. JSON in a ```json code fence
/// 2. JSON in a generic ``` code fence
/// 3. Raw JSON object somewhere in the text
///
/// Returns the extracted JSON string slice, or None if no JSON found.
pub fn extract_json_str(response: &str) -> Option<&str> {
    // Try ```json fence
    if let Some(start) = response.find("```json") {
        let content_start = start + 7;
        let end = response[content_start..]
            .find("```")
            .map(|e| content_start + e)?;
        return Some(response[content_start..end].trim());
    }

    // Try generic ``` fence
    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        // Skip language identifier on same line
        let line_end = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);
        let end = response[line_end..].find("```").map(|e| line_end + e)?;
        return Some(response[line_end..end].trim());
    }

    // Try raw JSON
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if start <= end {
        Some(response[start..=end].trim())
    } else {
        None
    }
}

/// Replace everything except ASCII letters and digits with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
