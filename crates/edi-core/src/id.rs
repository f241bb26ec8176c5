//! Thread id validation.
//!
//! A thread id must be non-empty, free of path-traversal sequences, and
//! match a conservative character class.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::CoreError;

static THREAD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid"));

/// Validate a thread id, returning it unchanged on success.
///
/// Rejects empty strings, `/`, `\`, `..`, and anything outside
/// `[A-Za-z0-9._-]+`. This is the sole gate that the file-system path
/// resolution in `edi-store` relies on to stay within the threads directory.
pub fn validate_thread_id(thread_id: &str) -> Result<&str, CoreError> {
    if thread_id.is_empty() {
        return Err(CoreError::invalid_thread_id(thread_id));
    }
    if thread_id.contains('/') || thread_id.contains('\\') || thread_id.contains("..") {
        return Err(CoreError::invalid_thread_id(thread_id));
    }
    if !THREAD_ID_RE.is_match(thread_id) {
        return Err(CoreError::invalid_thread_id(thread_id));
    }
    Ok(thread_id)
}

/// Generate a fresh 8-character thread id from a random UUID, as used by the
/// `/dispatch` and new-thread `/ask` flows.
#[must_use]
pub fn generate_thread_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_ids() {
        assert!(validate_thread_id("abc123").is_ok());
        assert!(validate_thread_id("a.b_c-d").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_thread_id("").is_err());
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(validate_thread_id("..").is_err());
        assert!(validate_thread_id("a/b").is_err());
        assert!(validate_thread_id("a\\b").is_err());
        assert!(validate_thread_id("../../etc/passwd").is_err());
    }

    #[test]
    fn rejects_non_matching_charset() {
        assert!(validate_thread_id("has space").is_err());
        assert!(validate_thread_id("emoji🙂").is_err());
    }

    #[test]
    fn generated_ids_are_eight_chars_and_valid() {
        let id = generate_thread_id();
        assert_eq!(id.len(), 8);
        assert!(validate_thread_id(&id).is_ok());
    }
}
