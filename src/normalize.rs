use crate::models::Value;

/// Canonical comparison key: lowercase, keep only alphanumerics and
/// whitespace, collapse whitespace runs to one space, trim.
pub fn normalize_text(input: &str) -> String {
    // whole-string lowercasing so context-dependent mappings (final sigma) apply
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Null and missing cells normalize to the empty key.
pub fn normalize_value(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_text)
        .map(normalize_text)
        .unwrap_or_default()
}
