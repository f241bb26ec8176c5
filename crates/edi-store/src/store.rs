//! [`ThreadStore`]: the append-only JSONL thread log.

use std::path::PathBuf;

use edi_core::ThreadEntry;
use parking_lot::Mutex;
use tracing::{instrument, warn};

use crate::errors::StoreError;
use crate::path::thread_file_path;

/// Owns the on-disk thread log files under a single threads directory.
///
/// Appends across all threads are serialized by one mutex: this keeps the
/// critical section to a single file open/write/close and never spans
/// subprocess execution, which happens entirely outside this type.
pub struct ThreadStore {
    threads_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl ThreadStore {
    #[must_use]
    pub fn new(threads_dir: PathBuf) -> Self {
        Self {
            threads_dir,
            append_lock: Mutex::new(()),
        }
    }

    /// Whether a thread file exists on disk, used to distinguish "no thread"
    /// from "empty thread" for callers of [`Self::load`].
    pub fn exists(&self, thread_id: &str) -> Result<bool, StoreError> {
        let path = thread_file_path(&self.threads_dir, thread_id)?;
        Ok(path.exists())
    }

    /// Load all entries for a thread. Lines that fail to parse are silently
    /// skipped; an absent file or any OS read error yields an empty list, not
    /// an error — callers that need to distinguish "absent" should call
    /// [`Self::exists`] first.
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub fn load(&self, thread_id: &str) -> Result<Vec<ThreadEntry>, StoreError> {
        let path = thread_file_path(&self.threads_dir, thread_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) => {
                warn!(error = %err, "failed to read thread file");
                return Ok(Vec::new());
            }
        };

        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ThreadEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(error = %err, "skipping corrupt thread line"),
            }
        }
        Ok(entries)
    }

    /// Append one entry to a thread's log, creating the threads directory and
    /// the thread file on demand.
    #[instrument(skip(self, entry), fields(thread_id = %thread_id, turn = entry.turn))]
    pub fn append(&self, thread_id: &str, entry: &ThreadEntry) -> Result<(), StoreError> {
        let path = thread_file_path(&self.threads_dir, thread_id)?;
        let line = serde_json::to_string(entry).expect("ThreadEntry always serializes");

        let _guard = self.append_lock.lock();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Write)?;
        }

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(StoreError::Write)?;
        writeln!(file, "{line}").map_err(StoreError::Write)?;
        Ok(())
    }
}
