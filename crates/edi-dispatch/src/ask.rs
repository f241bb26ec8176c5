//! [`AskFlow`]: new-thread vs continuation branches over the upstream
//! gateway. Does not touch [`edi_store::ThreadStore`]; durability of this
//! branch is the upstream gateway's responsibility.

use std::time::Duration;

use edi_core::validate_thread_id;
use edi_upstream::UpstreamClient;
use tokio::time::Instant;
use tracing::instrument;

use crate::errors::AskError;

/// Outcome of an ask request.
pub struct AskOutcome {
    pub reply: String,
    pub thread_id: String,
}

/// Generate a fresh 8-character thread id: the first 8 characters of a
/// UUID v4.
#[must_use]
pub fn generate_ask_thread_id() -> String {
    edi_core::generate_thread_id()
}

fn session_key_for(thread_id: &str) -> String {
    format!("edi:{thread_id}")
}

fn new_thread_wrapper(thread_id: &str, message: &str) -> String {
    format!(
        "[EDI CLI Request - Thread: {thread_id}]\n\n\
         You are EDI, responding to Claude Code (a coding assistant helping Neil with NEXUS).\n\
         This is a NEW thread. Keep responses focused and technical.\n\n\
         Request: {message}"
    )
}

/// Run the new-thread branch: trigger an upstream session, then poll its
/// history until an assistant reply appears or `timeout` elapses.
#[instrument(skip(upstream, message))]
pub async fn ask_new_thread(
    upstream: &UpstreamClient,
    thread_id: &str,
    message: &str,
    timeout_seconds: u64,
    poll_interval: Duration,
    initial_delay: Duration,
) -> Result<String, AskError> {
    let session_key = session_key_for(thread_id);
    let wrapped = new_thread_wrapper(thread_id, message);

    let hook_response = upstream
        .trigger_agent_hook(&session_key, &wrapped, timeout_seconds)
        .await;
    if !hook_response.ok {
        return Err(AskError::Upstream(
            hook_response.error.unwrap_or_else(|| "unknown upstream failure".to_string()),
        ));
    }

    poll_for_reply(upstream, &session_key, timeout_seconds, poll_interval, initial_delay).await
}

/// Run the continuation branch: synchronous `sessions_send`, extracting the
/// reply directly from the response envelope.
#[instrument(skip(upstream, message))]
pub async fn ask_continue_thread(
    upstream: &UpstreamClient,
    thread_id: &str,
    message: &str,
    timeout_seconds: u64,
) -> Result<String, AskError> {
    validate_thread_id(thread_id)?;
    let session_key = session_key_for(thread_id);

    let response = upstream.continue_thread(&session_key, message, timeout_seconds).await;
    if !response.ok {
        return Err(AskError::Upstream(
            response.error.clone().unwrap_or_else(|| "unknown upstream failure".to_string()),
        ));
    }

    response.extract_send_reply().ok_or(AskError::ReplyTimeout)
}

async fn poll_for_reply(
    upstream: &UpstreamClient,
    session_key: &str,
    timeout_seconds: u64,
    poll_interval: Duration,
    initial_delay: Duration,
) -> Result<String, AskError> {
    tokio::time::sleep(initial_delay).await;

    let deadline = Instant::now() + Duration::from_secs(timeout_seconds);
    loop {
        let history = upstream.get_session_history(session_key).await;
        if history.ok {
            if let Some(reply) = history.extract_last_assistant_reply() {
                return Ok(reply);
            }
        }

        if Instant::now() >= deadline {
            return Err(AskError::ReplyTimeout);
        }
        tokio::time::sleep(poll_interval).await;
    }
}
