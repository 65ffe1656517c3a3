//! Pull the JSON object out of free-form model output

use serde_json::Value;

/// First balanced `{...}` span in `text`
///
/// Braces inside JSON string literals are ignored. Returns `None` when the
/// text has no `{` or the first object is never closed (truncated output).
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and parse the first JSON object in `text`
pub fn parse_first_object(text: &str) -> Option<Value> {
    let span = first_json_object(text)?;
    serde_json::from_str::<Value>(span).ok()
}
