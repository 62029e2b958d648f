//! Content-kind detection for stored objects.
//!
//! Only the first received chunk is inspected. A magic-number match from
//! [`infer`] wins; otherwise UTF-8 text without NUL bytes is labelled
//! [`TEXT_KIND`] and anything else [`UNKNOWN_KIND`]. This is a best-effort
//! label, not a guarantee: a multi-byte character cut by the chunk boundary
//! is tolerated, but a chunk that happens to look like text may not be.

/// Label for objects that look like text.
pub const TEXT_KIND: &str = "text/plain";

/// Label for objects that match nothing.
pub const UNKNOWN_KIND: &str = "application/octet-stream";

/// Classify the first chunk of an object.
///
/// An empty chunk is text: an empty paste is most likely an empty string.
pub fn detect_kind(first_chunk: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(first_chunk) {
        return kind.mime_type();
    }

    if looks_like_text(first_chunk) {
        TEXT_KIND
    } else {
        UNKNOWN_KIND
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // `error_len() == None` means the input ended mid-character.
        Err(e) => e.error_len().is_none(),
    }
}
