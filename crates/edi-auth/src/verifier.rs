//! [`AuthVerifier`]: HMAC request signing and webhook signature verification.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::instrument;

use crate::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

const WEBHOOK_SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies two distinct signature schemes: a timestamp-bound HMAC over the
/// canonicalized parsed body for `/ask`, `/dispatch`, and cancel, and a
/// raw-bytes HMAC for the GitHub webhook.
pub struct AuthVerifier {
    auth_secret: Option<String>,
    webhook_secret: Option<String>,
    timestamp_tolerance_secs: i64,
}

impl AuthVerifier {
    #[must_use]
    pub fn new(
        auth_secret: Option<String>,
        webhook_secret: Option<String>,
        timestamp_tolerance_secs: i64,
    ) -> Self {
        Self {
            auth_secret,
            webhook_secret,
            timestamp_tolerance_secs,
        }
    }

    /// Whether request signing is required on `/ask`, `/dispatch`, and cancel.
    #[must_use]
    pub fn is_auth_enabled(&self) -> bool {
        self.auth_secret.is_some()
    }

    /// Whether the webhook route is enabled.
    #[must_use]
    pub fn is_webhook_enabled(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Verify a signed request body's timestamp and HMAC signature. No-op
    /// (returns `Ok`) when authentication is disabled.
    #[instrument(skip(self, body, timestamp, signature))]
    pub fn verify_request(
        &self,
        body: &Value,
        timestamp: Option<&str>,
        signature: Option<&str>,
        now: i64,
    ) -> Result<(), AuthError> {
        let Some(secret) = &self.auth_secret else {
            return Ok(());
        };

        let (timestamp, signature) = match (timestamp, signature) {
            (Some(t), Some(s)) => (t, s),
            _ => return Err(AuthError::MissingHeaders),
        };

        let ts: i64 = timestamp.parse().map_err(|_| AuthError::InvalidTimestamp)?;

        if (now - ts).abs() > self.timestamp_tolerance_secs {
            return Err(AuthError::TimestampExpired);
        }

        let canonical = edi_core::canonicalize(body);
        let signing_input = format!("{timestamp}:{canonical}");

        verify_hex_signature(secret.as_bytes(), signing_input.as_bytes(), signature)
            .map_err(|()| AuthError::InvalidSignature)
    }

    /// Verify a GitHub webhook signature over the raw request body.
    #[instrument(skip(self, raw_body, signature))]
    pub fn verify_webhook(&self, raw_body: &[u8], signature: Option<&str>) -> Result<(), AuthError> {
        let Some(secret) = &self.webhook_secret else {
            return Err(AuthError::WebhookSecretNotConfigured);
        };

        let signature = signature.ok_or(AuthError::MissingWebhookSignature)?;
        let hex_part = signature
            .strip_prefix(WEBHOOK_SIGNATURE_PREFIX)
            .ok_or(AuthError::InvalidWebhookSignature)?;

        verify_hex_signature(secret.as_bytes(), raw_body, hex_part)
            .map_err(|()| AuthError::InvalidWebhookSignature)
    }
}

#[cfg(test)]
fn hex_hmac(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a hex-encoded HMAC via `Mac::verify_slice`.
fn verify_hex_signature(secret: &[u8], message: &[u8], expected_hex: &str) -> Result<(), ()> {
    let expected_bytes = hex::decode(expected_hex).map_err(|_| ())?;
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(&expected_bytes).map_err(|_| ())
}
