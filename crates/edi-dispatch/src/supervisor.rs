//! [`TaskSupervisor`]: subprocess spawn, timeout, cancellation, and
//! terminal-state classification.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use edi_agent::build_agent_command;
use edi_core::{AgentKind, ThreadEntry};
use edi_store::ThreadStore;
use edi_upstream::UpstreamClient;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::registry::{TaskRegistry, TaskStatus};

/// Everything needed to supervise one dispatch task to a terminal state.
pub struct SupervisedTask {
    pub task_id: String,
    pub thread_id: String,
    pub turn: u64,
    pub agent: AgentKind,
    pub prompt: String,
    pub workdir: PathBuf,
    pub timeout_seconds: u64,
    pub callback_session_key: Option<String>,
}

/// Outcome of one supervised run, prior to classification into a
/// [`TaskStatus`].
struct RunResult {
    exit_code: Option<i32>,
    output: String,
    timed_out: bool,
    spawn_error: Option<String>,
}

/// Runs subprocess agents to completion and reconciles [`TaskRegistry`] and
/// [`ThreadStore`] state, optionally posting a result callback through
/// [`UpstreamClient`].
pub struct TaskSupervisor {
    store: Arc<ThreadStore>,
    registry: Arc<TaskRegistry>,
    upstream: Arc<UpstreamClient>,
}

impl TaskSupervisor {
    #[must_use]
    pub fn new(store: Arc<ThreadStore>, registry: Arc<TaskRegistry>, upstream: Arc<UpstreamClient>) -> Self {
        Self { store, registry, upstream }
    }

    /// Supervise `task` to a terminal state. Intended to be run inside a
    /// dedicated Tokio task spawned by the dispatch handler; this method
    /// itself does not spawn — the caller decides concurrency.
    #[instrument(skip(self, task, cancel), fields(task_id = %task.task_id, thread_id = %task.thread_id))]
    pub async fn run(&self, task: SupervisedTask, cancel: CancellationToken) {
        let run_result = self.spawn_and_wait(&task, &cancel).await;

        let canceled = cancel.is_cancelled();
        let (status, error) = classify(canceled, &run_result);

        let content = render_output(&run_result, error.as_deref());
        let entry = ThreadEntry::agent(task.turn, task.agent, content.clone(), run_result.exit_code);
        if let Err(err) = self.store.append(&task.thread_id, &entry) {
            warn!(error = %err, "failed to append agent reply to thread store");
        }

        let ended_at = chrono::Utc::now().timestamp();
        let exit_code = run_result.exit_code;
        let error_for_record = error.clone();
        if let Err(err) = self.registry.update(&task.task_id, |record| {
            record.status = status;
            record.ended_at = Some(ended_at);
            record.exit_code = exit_code;
            record.error = error_for_record;
        }) {
            warn!(error = %err, "failed to finalize task record");
        }

        metrics::counter!("edi_tasks_total", "status" => status_label(status)).increment(1);

        if let Some(session_key) = &task.callback_session_key {
            let message = render_callback_message(&task, status, exit_code, &content);
            let response = self
                .upstream
                .send_dispatch_callback(session_key, &message, task.timeout_seconds)
                .await;
            if !response.ok {
                warn!(error = ?response.error, "dispatch callback delivery failed");
            }
        }
    }

    async fn spawn_and_wait(&self, task: &SupervisedTask, cancel: &CancellationToken) -> RunResult {
        let command = build_agent_command(task.agent, &task.prompt, &task.workdir);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.workdir)
            .env("NO_COLOR", "1")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                return RunResult {
                    exit_code: None,
                    output: String::new(),
                    timed_out: false,
                    spawn_error: Some(format!("failed to spawn {}: {err}", command.program)),
                }
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_handle = tokio::spawn(read_to_end(stdout));
        let stderr_handle = tokio::spawn(read_to_end(stderr));

        let timeout = Duration::from_secs(task.timeout_seconds);

        tokio::select! {
            status = child.wait() => {
                let stdout_bytes = stdout_handle.await.unwrap_or_default();
                let stderr_bytes = stderr_handle.await.unwrap_or_default();
                let mut output = String::from_utf8_lossy(&stdout_bytes).into_owned();
                output.push_str(&String::from_utf8_lossy(&stderr_bytes));
                match status {
                    Ok(status) => RunResult {
                        exit_code: status.code(),
                        output,
                        timed_out: false,
                        spawn_error: None,
                    },
                    Err(err) => RunResult {
                        exit_code: None,
                        output,
                        timed_out: false,
                        spawn_error: Some(err.to_string()),
                    },
                }
            }
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                let stdout_bytes = stdout_handle.await.unwrap_or_default();
                let stderr_bytes = stderr_handle.await.unwrap_or_default();
                let mut output = String::from_utf8_lossy(&stdout_bytes).into_owned();
                output.push_str(&String::from_utf8_lossy(&stderr_bytes));
                RunResult {
                    exit_code: None,
                    output,
                    timed_out: true,
                    spawn_error: Some("timeout".to_string()),
                }
            }
            () = cancel.cancelled() => {
                terminate_gracefully(&mut child);
                let stdout_bytes = stdout_handle.await.unwrap_or_default();
                let stderr_bytes = stderr_handle.await.unwrap_or_default();
                let _ = child.wait().await;
                let mut output = String::from_utf8_lossy(&stdout_bytes).into_owned();
                output.push_str(&String::from_utf8_lossy(&stderr_bytes));
                RunResult {
                    exit_code: None,
                    output,
                    timed_out: false,
                    spawn_error: Some("canceled".to_string()),
                }
            }
        }
    }
}

/// Ask the child to exit via `SIGTERM` rather than the `SIGKILL` tokio's
/// `Child::kill` sends, giving it a chance to clean up. Falls back to a hard
/// kill if the process has no pid (already reaped) or the signal fails.
#[cfg(unix)]
fn terminate_gracefully(child: &mut tokio::process::Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let sent = child
        .id()
        .map(|pid| signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM));
    if !matches!(sent, Some(Ok(()))) {
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn terminate_gracefully(child: &mut tokio::process::Child) {
    let _ = child.start_kill();
}

async fn read_to_end(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> Vec<u8> {
    use tokio::io::AsyncReadExt;
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

fn classify(canceled: bool, result: &RunResult) -> (TaskStatus, Option<String>) {
    if canceled {
        return (TaskStatus::Canceled, result.spawn_error.clone());
    }
    if result.timed_out || result.spawn_error.is_some() && result.exit_code.is_none() {
        let error = result.spawn_error.clone().unwrap_or_else(|| "unknown failure".to_string());
        return (TaskStatus::Failed, Some(error));
    }
    match result.exit_code {
        Some(0) => (TaskStatus::Completed, None),
        Some(_) => (TaskStatus::Failed, None),
        None => (TaskStatus::Failed, Some("no exit code".to_string())),
    }
}

fn render_output(result: &RunResult, error: Option<&str>) -> String {
    let trimmed = result.output.trim_end();
    if trimmed.is_empty() {
        if let Some(error) = error {
            return format!("Error: {error}");
        }
    }
    trimmed.to_string()
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Running => "running",
        TaskStatus::Canceling => "canceling",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Canceled => "canceled",
    }
}

fn render_callback_message(task: &SupervisedTask, status: TaskStatus, exit_code: Option<i32>, output: &str) -> String {
    let exit_code_display = exit_code.map_or_else(|| "-".to_string(), |c| c.to_string());
    format!(
        "[EDI-Link Dispatch Result]\n\
         Thread: {}\n\
         Task: {}\n\
         Agent: {}\n\
         Status: {}\n\
         Exit code: {exit_code_display}\n\n\
         {output}",
        task.thread_id,
        task.task_id,
        task.agent.as_str(),
        status_label(status),
    )
}
