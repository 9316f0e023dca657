//! Locating the structured payload inside a free-text model response.
//!
//! The model wraps its JSON answer in commentary, markdown fences, or
//! both. We take the first balanced top-level `{...}` object, tracking
//! string and escape state so braces inside string values don't confuse
//! the scan. A truncated payload (opened but never closed) yields `None`.

/// Find the first balanced top-level JSON object in `text`.
pub fn find_json_payload(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
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
