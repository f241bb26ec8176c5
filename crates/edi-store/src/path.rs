//! Path-traversal-safe resolution of a thread id to its JSONL file.

use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// Resolve `thread_id` to `<threads_dir>/<thread_id>.jsonl`.
///
/// [`edi_core::validate_thread_id`] already rejects `/`, `\`, and `..`, so the
/// join below can never escape `threads_dir`; the parent-equality check below
/// is a defense-in-depth assertion of that invariant rather than the primary
/// guard.
pub fn thread_file_path(threads_dir: &Path, thread_id: &str) -> Result<PathBuf, StoreError> {
    let validated = edi_core::validate_thread_id(thread_id)?;
    let path = threads_dir.join(format!("{validated}.jsonl"));

    if path.parent() != Some(threads_dir) {
        return Err(StoreError::InvalidThreadId(thread_id.to_string()));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_within_threads_dir() {
        let dir = Path::new("/var/edi/threads");
        let path = thread_file_path(dir, "abc123").unwrap();
        assert_eq!(path, Path::new("/var/edi/threads/abc123.jsonl"));
    }

    #[test]
    fn rejects_traversal_ids() {
        let dir = Path::new("/var/edi/threads");
        assert!(thread_file_path(dir, "..").is_err());
        assert!(thread_file_path(dir, "a/b").is_err());
        assert!(thread_file_path(dir, "").is_err());
    }
}
