//! Settings loading: compiled defaults, secret resolution, and environment
//! variable overrides.
//!
//! Loading flow:
//! 1. Start with [`Settings::default`].
//! 2. Resolve the two secrets independently (env var, then file, then absent).
//! 3. Apply `EDI_DISPATCH_*` environment variable overrides, each bounds-checked.
//!
//! Invalid env var values are logged at `warn` and ignored, falling back to
//! the compiled default.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::Settings;

const AUTH_SECRET_ENV: &str = "EDI_AUTH_SECRET";
const AUTH_SECRET_FILE: &str = "/etc/edi/secret";
const GITHUB_WEBHOOK_SECRET_ENV: &str = "EDI_GITHUB_SECRET";
const GITHUB_WEBHOOK_SECRET_FILE: &str = "/etc/edi/github-secret";

/// Load settings from the process environment and the fixed secret file paths.
#[must_use]
pub fn load_settings() -> Settings {
    load_settings_from(
        Path::new(AUTH_SECRET_FILE),
        Path::new(GITHUB_WEBHOOK_SECRET_FILE),
    )
}

/// Load settings, resolving secrets against the given file paths instead of
/// the fixed `/etc/edi/*` locations. Exists so tests can exercise the
/// file-fallback path without touching the real filesystem root.
#[must_use]
pub fn load_settings_from(auth_secret_file: &Path, github_secret_file: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.auth_secret = resolve_secret(AUTH_SECRET_ENV, auth_secret_file);
    settings.github_webhook_secret = resolve_secret(GITHUB_WEBHOOK_SECRET_ENV, github_secret_file);
    apply_env_overrides(&mut settings);
    settings
}

/// Resolve a secret with priority: environment variable, then file, then absent.
fn resolve_secret(env_var: &str, file_path: &Path) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    if file_path.exists() {
        match std::fs::read_to_string(file_path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Err(err) => warn!(?file_path, error = %err, "failed to read secret file"),
        }
    }

    None
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_u64("EDI_DISPATCH_DEFAULT_TIMEOUT", 1, 86_400) {
        settings.dispatch.default_timeout_secs = v;
    }
    if let Some(v) = read_env_string("EDI_DISPATCH_WORKDIR") {
        settings.dispatch.default_workdir = expand_tilde(&v);
    }
    if let Some(v) = read_env_usize("EDI_DISPATCH_MAX_TURNS", 1, 10_000) {
        settings.dispatch.max_turns = v;
    }
    if let Some(v) = read_env_f64("EDI_DISPATCH_EARLY_CHECK_SECONDS", 0.0, 300.0) {
        settings.dispatch.early_check_secs = v;
    }

    // The upstream tokens are still "fixed constants" by default, but can be
    // swapped without a rebuild when deploying against a different gateway.
    if let Some(v) = read_env_string("EDI_UPSTREAM_HOOKS_TOKEN") {
        settings.upstream_hooks_token = v;
    }
    if let Some(v) = read_env_string("EDI_UPSTREAM_GATEWAY_TOKEN") {
        settings.upstream_gateway_token = v;
    }
}

/// Expand a leading `~/` to the `HOME` environment variable, leaving any
/// other path (including a bare `~` or an already-absolute path) untouched.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let parsed: Result<u64, _> = val.parse();
    match parsed {
        Ok(n) if n >= min && n <= max => Some(n),
        _ => {
            warn!(key = name, value = %val, "invalid u64 env var, ignoring");
            None
        }
    }
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let parsed: Result<usize, _> = val.parse();
    match parsed {
        Ok(n) if n >= min && n <= max => Some(n),
        _ => {
            warn!(key = name, value = %val, "invalid usize env var, ignoring");
            None
        }
    }
}

fn read_env_f64(name: &str, min: f64, max: f64) -> Option<f64> {
    let val = std::env::var(name).ok()?;
    let parsed: Result<f64, _> = val.parse();
    match parsed {
        Ok(n) if n >= min && n <= max => Some(n),
        _ => {
            warn!(key = name, value = %val, "invalid float env var, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_secret_absent_when_no_env_or_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(resolve_secret("EDI_TEST_SECRET_DOES_NOT_EXIST", &missing), None);
    }

    #[test]
    fn resolve_secret_reads_file_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "  s3cr3t  \n").unwrap();
        assert_eq!(
            resolve_secret("EDI_TEST_SECRET_DOES_NOT_EXIST", &path),
            Some("s3cr3t".to_string())
        );
    }

    #[test]
    fn expand_tilde_prefixes_home() {
        std::env::set_var("HOME", "/home/edi");
        assert_eq!(expand_tilde("~/nexus"), PathBuf::from("/home/edi/nexus"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    fn apply_env_overrides_ignores_out_of_range_values() {
        std::env::set_var("EDI_DISPATCH_MAX_TURNS", "0");
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings);
        assert_eq!(settings.dispatch.max_turns, 25);
        std::env::remove_var("EDI_DISPATCH_MAX_TURNS");
    }
}
