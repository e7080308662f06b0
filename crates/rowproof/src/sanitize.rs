//! Helpers for sanitizing data before it enters tracing spans or job rows.

/// Maximum number of characters persisted in `last_error`.
pub const MAX_ERROR_CHARS: usize = 1000;

/// Returns only the final component of a storage path.
///
/// Safe for span fields: reveals the object name without the athlete prefix.
pub fn redact_storage_path(path: &str) -> String {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Replaces every occurrence of `path` in `message` with its redacted form.
pub fn redact_path_in_message(message: &str, path: &str) -> String {
    if path.is_empty() {
        return message.to_string();
    }
    message.replace(path, &redact_storage_path(path))
}

/// Truncates an error message to [`MAX_ERROR_CHARS`] characters.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate_error(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_CHARS) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
