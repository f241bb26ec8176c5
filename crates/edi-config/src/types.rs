//! The [`Settings`] snapshot and its compiled defaults.

use std::path::PathBuf;

/// Dispatch-specific tunables, each independently overridable via the four
/// `EDI_DISPATCH_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// `EDI_DISPATCH_DEFAULT_TIMEOUT`, seconds. Default 3600.
    pub default_timeout_secs: u64,
    /// `EDI_DISPATCH_WORKDIR`, tilde-expanded. Default `~/nexus`.
    pub default_workdir: PathBuf,
    /// `EDI_DISPATCH_MAX_TURNS`, prompt-history retention. Default 25.
    pub max_turns: usize,
    /// `EDI_DISPATCH_EARLY_CHECK_SECONDS`, pre-response window. Default 5.
    pub early_check_secs: f64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_timeout_secs: 3600,
            default_workdir: default_workdir(),
            max_turns: 25,
            early_check_secs: 5.0,
        }
    }
}

fn default_workdir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join("nexus"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/nexus"))
}

fn default_threads_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".edi-link").join("threads"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/.edi-link/threads"))
}

/// The full, immutable configuration snapshot consulted by every component.
///
/// Fields not listed as environment-overridable above are fixed compiled
/// constants: listen address, upstream URL/tokens, poll interval, and the
/// auth timestamp tolerance are never read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub listen_host: String,
    pub listen_port: u16,
    pub metrics_port: u16,
    pub threads_dir: PathBuf,

    pub upstream_base_url: String,
    pub upstream_hooks_token: String,
    pub upstream_gateway_token: String,
    pub upstream_call_timeout_secs: u64,

    pub ask_default_timeout_secs: u64,
    pub ask_poll_interval_secs: u64,
    pub ask_initial_delay_secs: u64,

    pub auth_timestamp_tolerance_secs: i64,
    pub max_request_bytes: usize,

    pub dispatch: DispatchSettings,

    /// The resolved HMAC signing secret, or `None` when authentication is disabled.
    pub auth_secret: Option<String>,
    /// The resolved webhook signing secret, or `None` when the webhook route is disabled.
    pub github_webhook_secret: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 19001,
            metrics_port: 19002,
            threads_dir: default_threads_dir(),

            upstream_base_url: "http://127.0.0.1:18789".to_string(),
            upstream_hooks_token: "edi-hook-secret-2026".to_string(),
            upstream_gateway_token: "h2WzPZjazQG8CQYrS8RgXI5MMVWFh6SI".to_string(),
            upstream_call_timeout_secs: 15,

            ask_default_timeout_secs: 120,
            ask_poll_interval_secs: 1,
            ask_initial_delay_secs: 2,

            auth_timestamp_tolerance_secs: 300,
            max_request_bytes: 1024 * 1024,

            dispatch: DispatchSettings::default(),

            auth_secret: None,
            github_webhook_secret: None,
        }
    }
}
