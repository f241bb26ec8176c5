//! [`AgentCommand`]: argv construction for the three supported agents.

use std::path::Path;

use edi_core::AgentKind;

/// A resolved subprocess invocation: program, arguments, working directory.
///
/// Carries only the argv/cwd pair. Environment variables (`NO_COLOR=1`, and
/// inheriting the parent environment) are the spawner's responsibility —
/// `TaskSupervisor` sets them when it actually spawns the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: String,
}

/// Build the argv vector for `kind` given `prompt` and `workdir`.
#[must_use]
pub fn build_agent_command(kind: AgentKind, prompt: &str, workdir: &Path) -> AgentCommand {
    let workdir_str = workdir.to_string_lossy().into_owned();
    match kind {
        AgentKind::Codex => AgentCommand {
            program: "codex".to_string(),
            args: vec![
                "exec".to_string(),
                "--dangerously-bypass-approvals-and-sandbox".to_string(),
                "--color".to_string(),
                "never".to_string(),
                "--skip-git-repo-check".to_string(),
                "-C".to_string(),
                workdir_str.clone(),
                prompt.to_string(),
            ],
            workdir: workdir_str,
        },
        AgentKind::Claude => AgentCommand {
            program: "claude".to_string(),
            args: vec![
                "-p".to_string(),
                "--output-format".to_string(),
                "text".to_string(),
                "--permission-mode".to_string(),
                "bypassPermissions".to_string(),
                "--allow-dangerously-skip-permissions".to_string(),
                "--dangerously-skip-permissions".to_string(),
                "--no-session-persistence".to_string(),
                prompt.to_string(),
            ],
            workdir: workdir_str,
        },
        AgentKind::Gemini => AgentCommand {
            program: "gemini".to_string(),
            args: vec![
                "-p".to_string(),
                prompt.to_string(),
                "--output-format".to_string(),
                "text".to_string(),
                "--approval-mode".to_string(),
                "yolo".to_string(),
            ],
            workdir: workdir_str,
        },
    }
}
