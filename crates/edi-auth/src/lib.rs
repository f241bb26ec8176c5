//! # edi-auth
//!
//! HMAC request signing and webhook signature verification.
//!
//! - [`verifier::AuthVerifier`] — the two verification schemes.
//! - [`errors`] — the [`errors::AuthError`] taxonomy.
//!
//! Construct an [`AuthVerifier`] from a resolved [`edi_config::Settings`]
//! snapshot via [`AuthVerifier::from_settings`].

#![deny(unsafe_code)]

pub mod errors;
pub mod verifier;

pub use errors::AuthError;
pub use verifier::AuthVerifier;

impl AuthVerifier {
    /// Build an [`AuthVerifier`] from a resolved settings snapshot.
    #[must_use]
    pub fn from_settings(settings: &edi_config::Settings) -> Self {
        Self::new(
            settings.auth_secret.clone(),
            settings.github_webhook_secret.clone(),
            settings.auth_timestamp_tolerance_secs,
        )
    }
}
