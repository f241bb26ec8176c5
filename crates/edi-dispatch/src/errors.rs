//! Error taxonomy for dispatch, task supervision, and the ask/webhook flows.

use thiserror::Error;

/// Errors raised while supervising or querying a dispatch task.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] edi_core::CoreError),

    #[error(transparent)]
    Store(#[from] edi_store::StoreError),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("the configured workdir {0} does not exist or is not a directory")]
    InvalidWorkdir(String),

    #[error("timeout must be a positive number of seconds")]
    InvalidTimeout,
}

impl DispatchError {
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Core(_) | Self::UnknownTask(_) | Self::InvalidWorkdir(_) | Self::InvalidTimeout
        )
    }
}

/// Errors raised by the ask flow.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("invalid threadId: {0}")]
    InvalidThreadId(#[from] edi_core::CoreError),

    #[error("upstream call failed: {0}")]
    Upstream(String),

    #[error("timed out waiting for a reply")]
    ReplyTimeout,
}

/// Errors raised by the webhook flow.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Auth(#[from] edi_auth::AuthError),

    #[error("webhook secret is not configured")]
    SecretNotConfigured,

    #[error("upstream call failed: {0}")]
    Upstream(String),
}
