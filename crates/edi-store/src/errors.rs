//! Errors raised by [`crate::ThreadStore`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid threadId: {0}")]
    InvalidThreadId(String),

    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    #[error("failed to write thread entry: {0}")]
    Write(#[source] std::io::Error),
}

impl From<edi_core::CoreError> for StoreError {
    fn from(err: edi_core::CoreError) -> Self {
        match err {
            edi_core::CoreError::InvalidThreadId(id) => Self::InvalidThreadId(id),
            other => Self::InvalidThreadId(other.to_string()),
        }
    }
}
