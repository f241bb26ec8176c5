//! Errors raised by [`crate::AuthVerifier`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing X-EDI-Timestamp or X-EDI-Signature header")]
    MissingHeaders,

    #[error("invalid timestamp format")]
    InvalidTimestamp,

    #[error("timestamp expired (replay protection)")]
    TimestampExpired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing X-Hub-Signature-256 header")]
    MissingWebhookSignature,

    #[error("invalid signature")]
    InvalidWebhookSignature,

    #[error("GitHub webhook secret not configured")]
    WebhookSecretNotConfigured,
}
