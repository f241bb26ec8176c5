//! # edi-config
//!
//! Layered runtime configuration for the EDI dispatch gateway.
//!
//! Settings are resolved once per process from (in priority order):
//! 1. **Compiled defaults** — [`Settings::default`].
//! 2. **Secret files** — `/etc/edi/secret`, `/etc/edi/github-secret`.
//! 3. **Environment variables** — `EDI_AUTH_SECRET`, `EDI_GITHUB_SECRET`, and
//!    the `EDI_DISPATCH_*` tunables (highest priority for the secrets; the
//!    dispatch tunables only ever come from the environment).
//!
//! # Usage
//!
//! ```no_run
//! use edi_config::get_settings;
//!
//! let settings = get_settings();
//! println!("listening on {}:{}", settings.listen_host, settings.listen_port);
//! ```

#![deny(unsafe_code)]

pub mod loader;
pub mod types;

pub use loader::{expand_tilde, load_settings, load_settings_from};
pub use types::{DispatchSettings, Settings};

use std::sync::{Arc, RwLock};

/// Global settings singleton.
///
/// `RwLock<Option<Arc<Settings>>>` rather than `OnceLock` so tests can
/// install a fixture snapshot via [`init_settings`] without touching the
/// real process environment.
static SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Get the global settings instance, loading it from the environment and
/// secret files on first call.
pub fn get_settings() -> Arc<Settings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(load_settings());
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Install a specific settings value as the global singleton.
///
/// Intended for process startup (once the CLI has parsed overrides) and for
/// tests that need a fixture snapshot.
pub fn init_settings(settings: Settings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reset the global settings cache (test-only).
#[cfg(test)]
pub(crate) fn reset_settings() {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = None;
}
