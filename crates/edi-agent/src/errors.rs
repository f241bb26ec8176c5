//! Error taxonomy for agent-kind resolution.

use thiserror::Error;

/// Errors raised while building an agent invocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    /// The agent-kind string did not match any known agent.
    #[error("unknown agent kind: {0}")]
    UnknownAgent(String),
}
