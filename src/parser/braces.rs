// Top-level JSON object scanner for replies without code fences

/// Return the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward nesting. Returns None when no opening brace exists or the first
/// object never closes.
pub fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_object() {
        assert_eq!(first_object_span("x {\"a\": 1} y"), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_nested_object() {
        let text = "Result: {\"a\": {\"b\": [1, {\"c\": 2}]}} and {\"d\": 3}";
        assert_eq!(first_object_span(text), Some("{\"a\": {\"b\": [1, {\"c\": 2}]}}"));
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"title": "Sales {Q4} \"}\"", "n": 1} trailing }"#;
        assert_eq!(first_object_span(text), Some(r#"{"title": "Sales {Q4} \"}\"", "n": 1}"#));
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(first_object_span("{\"a\": {\"b\": 1}"), None);
    }

    #[test]
    fn test_no_brace() {
        assert_eq!(first_object_span("plain text"), None);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(first_object_span("température → {\"é\": \"ü\"}"), Some("{\"é\": \"ü\"}"));
    }
}
