//! [`WebhookFlow`]: verify a signed GitHub webhook and fire-and-forget a
//! notification through the upstream gateway.

use edi_auth::AuthVerifier;
use edi_upstream::UpstreamClient;
use serde_json::Value;
use tracing::instrument;

use crate::errors::WebhookError;

const COMMIT_MESSAGE_TRUNCATE_AT: usize = 200;

/// Outcome of a processed webhook.
pub struct WebhookOutcome {
    pub run_id: String,
    pub session_key: String,
}

fn str_field<'a>(body: &'a Value, key: &str, default: &'a str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn branch_from_ref(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn short_sha(sha: &str) -> &str {
    if sha.len() >= 7 {
        &sha[..7]
    } else {
        sha
    }
}

fn repo_name(repository: &str) -> &str {
    repository.rsplit('/').next().unwrap_or(repository)
}

fn truncate_commit_message(message: &str) -> String {
    if message.chars().count() > COMMIT_MESSAGE_TRUNCATE_AT {
        let truncated: String = message.chars().take(COMMIT_MESSAGE_TRUNCATE_AT).collect();
        format!("{truncated}...")
    } else {
        message.to_string()
    }
}

fn notification_message(repository: &str, branch: &str, sha: &str, commit_message: &str) -> String {
    format!(
        "[GitHub Webhook - Repo Update]\n\n\
         Repository: {repository}\n\
         Branch: {branch}\n\
         Commit: {sha}\n\
         Message: \"{}\"\n\n\
         Please pull the latest changes and run the test suite.",
        truncate_commit_message(commit_message),
    )
}

/// Process a signed GitHub webhook: verify the raw body against
/// `X-Hub-Signature-256`, derive a session key, and fire a notification
/// through `/hooks/agent` without waiting for a reply.
#[instrument(skip(auth, upstream, raw_body, signature))]
pub async fn handle_webhook(
    auth: &AuthVerifier,
    upstream: &UpstreamClient,
    raw_body: &[u8],
    signature: Option<&str>,
    default_timeout_seconds: u64,
) -> Result<WebhookOutcome, WebhookError> {
    if !auth.is_webhook_enabled() {
        return Err(WebhookError::SecretNotConfigured);
    }
    auth.verify_webhook(raw_body, signature)?;

    let body: Value = serde_json::from_slice(raw_body).unwrap_or(Value::Null);
    let repository = str_field(&body, "repository", "unknown/repo");
    let reference = str_field(&body, "ref", "refs/heads/unknown");
    let sha = str_field(&body, "sha", "unknown");
    let commit_message = str_field(&body, "message", "");

    let branch = branch_from_ref(reference);
    let sha_short = short_sha(sha);
    let session_key = format!("github:{}:{sha_short}", repo_name(repository));
    let message = notification_message(repository, branch, sha_short, commit_message);

    let response = upstream
        .trigger_agent_hook(&session_key, &message, default_timeout_seconds)
        .await;
    if !response.ok {
        return Err(WebhookError::Upstream(
            response.error.unwrap_or_else(|| "unknown upstream failure".to_string()),
        ));
    }

    Ok(WebhookOutcome {
        run_id: response.run_id.unwrap_or_else(|| "unknown".to_string()),
        session_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_from_ref_takes_last_segment() {
        assert_eq!(branch_from_ref("refs/heads/main"), "main");
        assert_eq!(branch_from_ref("main"), "main");
    }

    #[test]
    fn short_sha_truncates_to_seven_chars() {
        assert_eq!(short_sha("abcdef1234567"), "abcdef1");
        assert_eq!(short_sha("abc"), "abc");
    }

    #[test]
    fn repo_name_takes_last_segment() {
        assert_eq!(repo_name("neil/nexus"), "nexus");
        assert_eq!(repo_name("nexus"), "nexus");
    }

    #[test]
    fn truncate_commit_message_appends_ellipsis_past_200_chars() {
        let long = "a".repeat(250);
        let truncated = truncate_commit_message(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncate_commit_message_leaves_short_messages_alone() {
        assert_eq!(truncate_commit_message("fix bug"), "fix bug");
    }

    #[test]
    fn notification_message_matches_fixed_template() {
        let message = notification_message("neil/nexus", "main", "abcdef1", "fix bug");
        assert_eq!(
            message,
            "[GitHub Webhook - Repo Update]\n\n\
             Repository: neil/nexus\n\
             Branch: main\n\
             Commit: abcdef1\n\
             Message: \"fix bug\"\n\n\
             Please pull the latest changes and run the test suite."
        );
    }
}
