//! [`TaskRegistry`]: the in-memory `taskId -> TaskRecord` table.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::DispatchError;

/// The lifecycle status of a dispatch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Canceling,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

/// The public view of a [`TaskRecord`] exposed by the listing endpoint.
///
/// Carries no private handles (no cancellation token, no child process) —
/// the registry never hands those to callers.
#[derive(Debug, Clone, Serialize)]
pub struct PublicTaskRecord {
    pub task_id: String,
    pub thread_id: String,
    pub agent: String,
    pub status: TaskStatus,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

/// One dispatch task. Private handles (`cancel`) live alongside the public
/// fields; [`TaskRegistry::list_running`] strips them before returning.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub thread_id: String,
    pub agent: String,
    pub status: TaskStatus,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub workdir: PathBuf,
    pub timeout_seconds: u64,
    /// Signals the supervisor to begin graceful cancellation. Never exposed
    /// outside this crate.
    pub(crate) cancel: CancellationToken,
}

impl TaskRecord {
    fn to_public(&self) -> PublicTaskRecord {
        PublicTaskRecord {
            task_id: self.task_id.clone(),
            thread_id: self.thread_id.clone(),
            agent: self.agent.clone(),
            status: self.status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            exit_code: self.exit_code,
            error: self.error.clone(),
        }
    }
}

/// An `id -> TaskRecord` mapping protected by one mutex.
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskRecord>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a newly accepted task in the `running` state.
    pub fn create(
        &self,
        task_id: String,
        thread_id: String,
        agent: String,
        started_at: i64,
        workdir: PathBuf,
        timeout_seconds: u64,
    ) -> CancellationToken {
        let cancel = CancellationToken::new();
        let record = TaskRecord {
            task_id: task_id.clone(),
            thread_id,
            agent,
            status: TaskStatus::Running,
            started_at,
            ended_at: None,
            exit_code: None,
            error: None,
            workdir,
            timeout_seconds,
            cancel: cancel.clone(),
        };
        let _previous = self.tasks.lock().insert(task_id, record);
        cancel
    }

    /// Copy-on-write update of an existing record under the lock.
    pub fn update(&self, task_id: &str, update: impl FnOnce(&mut TaskRecord)) -> Result<(), DispatchError> {
        let mut tasks = self.tasks.lock();
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| DispatchError::UnknownTask(task_id.to_string()))?;
        update(record);
        Ok(())
    }

    /// Fetch a snapshot of one record's public view.
    #[must_use]
    pub fn get(&self, task_id: &str) -> Option<PublicTaskRecord> {
        self.tasks.lock().get(task_id).map(TaskRecord::to_public)
    }

    /// Fetch the raw status of one record, without cloning the full record.
    #[must_use]
    pub fn status_of(&self, task_id: &str) -> Option<TaskStatus> {
        self.tasks.lock().get(task_id).map(|r| r.status)
    }

    /// Request cancellation of a running task. Idempotent: canceling an
    /// already-`canceling` task is a no-op; canceling a terminal task leaves
    /// it untouched and returns its current status.
    pub fn request_cancel(&self, task_id: &str) -> Result<TaskStatus, DispatchError> {
        let mut tasks = self.tasks.lock();
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| DispatchError::UnknownTask(task_id.to_string()))?;
        if record.status == TaskStatus::Running {
            record.status = TaskStatus::Canceling;
            record.cancel.cancel();
        }
        Ok(record.status)
    }

    /// Snapshot of every record still `running` or `canceling`, sorted by
    /// `startedAt` ascending, with no private handles.
    #[must_use]
    pub fn list_running(&self) -> Vec<PublicTaskRecord> {
        let tasks = self.tasks.lock();
        let mut running: Vec<PublicTaskRecord> = tasks
            .values()
            .filter(|r| !r.status.is_terminal())
            .map(TaskRecord::to_public)
            .collect();
        running.sort_by_key(|r| r.started_at);
        running
    }
}
