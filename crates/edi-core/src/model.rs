//! Thread and entry types, and the binding-inference rule.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The closed set of headless coding agents this gateway knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Codex,
    Claude,
    Gemini,
}

impl AgentKind {
    /// Parse an agent-kind from its wire representation (`"codex"`, `"claude"`, `"gemini"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "codex" => Some(Self::Codex),
            "claude" => Some(Self::Claude),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// The wire representation of this agent-kind (also used as the thread-entry `role`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    /// A fixed human-friendly label used by [`crate::model`] consumers such as
    /// the prompt builder.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Codex => "Codex",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
        }
    }
}

/// One immutable turn in a thread's JSONL log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEntry {
    pub turn: u64,
    pub role: String,
    pub content: String,
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ThreadEntry {
    /// Build an `edi`-authored entry for the given turn, stamped with the
    /// current wall-clock time.
    #[must_use]
    pub fn edi(turn: u64, content: impl Into<String>) -> Self {
        Self {
            turn,
            role: "edi".to_string(),
            content: content.into(),
            ts: chrono::Utc::now().timestamp(),
            exit_code: None,
        }
    }

    /// Build an agent-authored entry for the given turn.
    #[must_use]
    pub fn agent(turn: u64, agent: AgentKind, content: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            turn,
            role: agent.as_str().to_string(),
            content: content.into(),
            ts: chrono::Utc::now().timestamp(),
            exit_code,
        }
    }
}

/// One greater than the maximum `turn` present, or 1 when `entries` is empty.
///
/// Non-integer or absent turns are impossible once entries are typed as
/// [`ThreadEntry`]; stray values in a `.jsonl` file are only ever tolerated
/// at the parsing boundary in `edi-store`, never here.
#[must_use]
pub fn next_turn(entries: &[ThreadEntry]) -> u64 {
    entries.iter().map(|e| e.turn).max().map_or(1, |max| max + 1)
}

/// Keep only the entries among the most recent `max_turns` distinct turn
/// numbers, preserving insertion order.
#[must_use]
pub fn filter_recent(entries: &[ThreadEntry], max_turns: usize) -> Vec<ThreadEntry> {
    if max_turns == 0 {
        return Vec::new();
    }

    let mut turn_order = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if seen.insert(entry.turn) {
            turn_order.push(entry.turn);
        }
    }

    if turn_order.len() <= max_turns {
        return entries.to_vec();
    }

    let selected: std::collections::HashSet<u64> =
        turn_order[turn_order.len() - max_turns..].iter().copied().collect();
    entries
        .iter()
        .filter(|e| selected.contains(&e.turn))
        .cloned()
        .collect()
}

/// The agent-kind a thread is committed to, inferred from its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadBinding {
    /// No non-`edi` entries yet; any agent-kind may dispatch into this thread.
    Unbound,
    /// Exactly one distinct non-`edi` role has appeared.
    Bound(AgentKind),
    /// Two or more distinct non-`edi` roles have appeared; dispatch must be rejected.
    Mixed,
}

/// Infer the [`ThreadBinding`] of a thread from its entries.
///
/// Unknown role strings (entries written by an agent-kind this build no
/// longer recognizes) still count toward the mixed-binding determination
/// even though they cannot be parsed back into an [`AgentKind`].
#[must_use]
pub fn infer_binding(entries: &[ThreadEntry]) -> ThreadBinding {
    let mut roles: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for entry in entries {
        if entry.role != "edi" {
            roles.insert(entry.role.as_str());
        }
    }

    match roles.len() {
        0 => ThreadBinding::Unbound,
        1 => {
            let role = *roles.iter().next().expect("len checked above");
            match AgentKind::parse(role) {
                Some(agent) => ThreadBinding::Bound(agent),
                None => ThreadBinding::Mixed,
            }
        }
        _ => ThreadBinding::Mixed,
    }
}

/// Validate that `requested` may dispatch into a thread with the given
/// `binding`.
pub fn check_binding(binding: ThreadBinding, requested: AgentKind) -> Result<(), CoreError> {
    match binding {
        ThreadBinding::Unbound => Ok(()),
        ThreadBinding::Bound(existing) if existing == requested => Ok(()),
        ThreadBinding::Bound(existing) => Err(CoreError::ThreadBindingConflict {
            bound: existing.as_str().to_string(),
        }),
        ThreadBinding::Mixed => Err(CoreError::MixedBinding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edi(turn: u64) -> ThreadEntry {
        ThreadEntry::edi(turn, "hi")
    }

    fn agent(turn: u64, kind: AgentKind) -> ThreadEntry {
        ThreadEntry::agent(turn, kind, "ok", Some(0))
    }

    #[test]
    fn next_turn_on_empty_is_one() {
        assert_eq!(next_turn(&[]), 1);
    }

    #[test]
    fn next_turn_is_max_plus_one() {
        let entries = vec![edi(1), agent(1, AgentKind::Codex), edi(2)];
        assert_eq!(next_turn(&entries), 3);
    }

    #[test]
    fn filter_recent_keeps_insertion_order() {
        let entries = vec![edi(1), edi(2), edi(3), edi(4)];
        let filtered = filter_recent(&entries, 2);
        let turns: Vec<u64> = filtered.iter().map(|e| e.turn).collect();
        assert_eq!(turns, vec![3, 4]);
    }

    #[test]
    fn filter_recent_is_idempotent_when_k_covers_all() {
        let entries = vec![edi(1), edi(2)];
        let once = filter_recent(&entries, 5);
        let twice = filter_recent(&once, 5);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn filter_recent_zero_max_turns_is_empty() {
        let entries = vec![edi(1)];
        assert!(filter_recent(&entries, 0).is_empty());
    }

    #[test]
    fn binding_unbound_on_empty_thread() {
        assert_eq!(infer_binding(&[]), ThreadBinding::Unbound);
    }

    #[test]
    fn binding_bound_to_single_agent() {
        let entries = vec![edi(1), agent(1, AgentKind::Codex)];
        assert_eq!(infer_binding(&entries), ThreadBinding::Bound(AgentKind::Codex));
    }

    #[test]
    fn binding_mixed_with_two_agents() {
        let entries = vec![agent(1, AgentKind::Codex), agent(2, AgentKind::Claude)];
        assert_eq!(infer_binding(&entries), ThreadBinding::Mixed);
    }

    #[test]
    fn check_binding_allows_matching_agent() {
        assert!(check_binding(ThreadBinding::Bound(AgentKind::Codex), AgentKind::Codex).is_ok());
    }

    #[test]
    fn check_binding_rejects_conflicting_agent() {
        let err = check_binding(ThreadBinding::Bound(AgentKind::Codex), AgentKind::Claude).unwrap_err();
        assert!(matches!(err, CoreError::ThreadBindingConflict { .. }));
    }

    #[test]
    fn check_binding_rejects_mixed() {
        let err = check_binding(ThreadBinding::Mixed, AgentKind::Codex).unwrap_err();
        assert!(matches!(err, CoreError::MixedBinding));
    }
}
