//! Error taxonomy for thread-id validation and thread binding.

use thiserror::Error;

/// Errors raised by pure, dependency-free logic in [`crate::id`] and [`crate::model`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The supplied thread id failed the character-class or path-traversal check.
    #[error("invalid threadId: {0}")]
    InvalidThreadId(String),

    /// The thread already carries entries from an agent other than the one requested.
    #[error("Thread already bound to {bound}")]
    ThreadBindingConflict {
        /// The agent-kind the thread is already bound to.
        bound: String,
    },

    /// The thread carries entries from more than one distinct agent-kind.
    #[error("Thread has mixed agent bindings")]
    MixedBinding,
}

impl CoreError {
    /// Construct an [`CoreError::InvalidThreadId`] for the given raw id.
    #[must_use]
    pub fn invalid_thread_id(raw: impl Into<String>) -> Self {
        Self::InvalidThreadId(raw.into())
    }

    /// `true` for errors that should surface as HTTP 400 at the call boundary.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidThreadId(_) | Self::ThreadBindingConflict { .. } | Self::MixedBinding
        )
    }
}
