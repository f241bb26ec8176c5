//! [`build_prompt`]: assemble a continuation prompt from prior turns.

use edi_core::{AgentKind, ThreadEntry};

/// Build the fixed-template prompt for continuing a thread with `agent`,
/// given the already-filtered prior entries and the new user message.
///
/// Prior `edi` entries are labeled `[EDI]`; prior entries produced by an
/// agent are labeled with that agent-kind's human-friendly name, not
/// necessarily `agent` — a thread can only be bound to one agent-kind, but
/// the label is derived from each entry's own role so this still renders
/// sensibly if called on a not-yet-bound thread's history.
#[must_use]
pub fn build_prompt(entries: &[ThreadEntry], new_message: &str, _agent: AgentKind) -> String {
    let mut transcript = String::new();
    for entry in entries {
        let label = match AgentKind::parse(&entry.role) {
            Some(kind) => kind.label(),
            None => "EDI",
        };
        transcript.push_str(&format!("[{label}] {}\n", entry.content));
    }
    let transcript = transcript.trim_end_matches('\n');

    format!(
        "You are continuing a task. Here is the conversation so far:\n\n\
         ---\n{transcript}\n---\n\n\
         Now continue:\n[EDI] {new_message}"
    )
}
