//! # edi-agent
//!
//! Prompt assembly and subprocess argv construction for the three
//! supported headless coding agents.
//!
//! - [`prompt::build_prompt`] — the fixed continuation-prompt template.
//! - [`command::build_agent_command`] — per-agent argv/cwd construction.
//! - [`parse_agent_kind`] — parse a request-supplied agent name, rejecting
//!   anything outside the closed three-agent enumeration.

#![deny(unsafe_code)]

pub mod command;
pub mod errors;
pub mod prompt;

pub use command::{build_agent_command, AgentCommand};
pub use errors::AgentError;
pub use prompt::build_prompt;

use edi_core::AgentKind;

/// Parse a raw agent-kind string from a request, rejecting anything outside
/// the closed `codex`/`claude`/`gemini` enumeration.
pub fn parse_agent_kind(raw: &str) -> Result<AgentKind, AgentError> {
    AgentKind::parse(raw).ok_or_else(|| AgentError::UnknownAgent(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_agent_kind_accepts_known_kinds() {
        assert_eq!(parse_agent_kind("codex"), Ok(AgentKind::Codex));
        assert_eq!(parse_agent_kind("claude"), Ok(AgentKind::Claude));
        assert_eq!(parse_agent_kind("gemini"), Ok(AgentKind::Gemini));
    }

    #[test]
    fn parse_agent_kind_rejects_unknown() {
        assert_eq!(
            parse_agent_kind("copilot"),
            Err(AgentError::UnknownAgent("copilot".to_string()))
        );
    }
}
