//! Locating the JSON payload inside model output.

/// Pull a JSON object out of a model reply.
///
/// Accepts a ```json fence, a plain fence (skipping a language tag line), or
/// prose around a bare object. Text with no braces is returned unchanged so the
/// parser reports the error.
pub fn extract_json(response: &str) -> &str {
    if let Some(start) = response.find("```json") {
        if let Some(end) = response[start + 7..].find("```") {
            return response[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = response.find("```") {
        if let Some(end) = response[start + 3..].find("```") {
            let content = response[start + 3..start + 3 + end].trim();
            if let Some(newline_pos) = content.find('\n') {
                let first_line = &content[..newline_pos];
                if !first_line.starts_with('{') {
                    return content[newline_pos + 1..].trim();
                }
            }
            return content;
        }
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return &response[start..=end];
        }
    }

    response.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fence() {
        let raw = "Her er nivået:\n```json\n{\"a\": 1}\n```\nLykke til";
        assert_eq!(extract_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_plain_fence_with_language_tag() {
        let raw = "```JSON\n{\"a\": 1}\n```";
        assert_eq!(extract_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Selvsagt! {\"scenarios\": []} Håper det hjelper.";
        assert_eq!(extract_json(raw), "{\"scenarios\": []}");
    }

    #[test]
    fn test_no_object_returns_input() {
        assert_eq!(extract_json("  ingen json her "), "ingen json her");
    }
}
