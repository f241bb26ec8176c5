//! [`UpstreamClient`]: outbound HTTP to the upstream agent gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{instrument, warn};

/// The namespace every tool-invocation session key is qualified with, unless
/// it already carries the `agent:` prefix (the dispatch callback path may
/// pass an already-qualified key through).
const SESSION_NAMESPACE: &str = "agent:main:";

/// The response envelope every upstream call is folded into: `{ok, error}`
/// when the call failed for any reason (non-2xx, transport error), or
/// `{ok: true, result, run_id}` on success. Callers branch on `ok` alone.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, rename = "runId")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UpstreamResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            run_id: None,
            error: Some(error.into()),
        }
    }

    /// Extract the assistant reply from a `sessions_send` result.
    #[must_use]
    pub fn extract_send_reply(&self) -> Option<String> {
        if !self.ok {
            return None;
        }
        self.result
            .as_ref()?
            .get("details")?
            .get("reply")?
            .as_str()
            .map(str::to_string)
    }

    /// Extract the last assistant reply from a `sessions_history` result.
    #[must_use]
    pub fn extract_last_assistant_reply(&self) -> Option<String> {
        if !self.ok {
            return None;
        }
        let messages = self
            .result
            .as_ref()?
            .get("details")?
            .get("messages")?
            .as_array()?;

        for message in messages.iter().rev() {
            if message.get("role").and_then(Value::as_str) != Some("assistant") {
                continue;
            }
            let content = message.get("content")?;
            if let Some(text) = content.as_str() {
                return Some(text.to_string());
            }
            if let Some(blocks) = content.as_array() {
                for block in blocks {
                    if block.get("type").and_then(Value::as_str) == Some("text") {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            return Some(text.to_string());
                        }
                    }
                }
            }
        }
        None
    }
}

/// Outbound client for the two upstream paths: the agent-hook endpoint
/// (session creation) and the tool-invocation endpoint (`sessions_send`,
/// `sessions_history`).
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    hooks_token: String,
    gateway_token: String,
}

impl UpstreamClient {
    #[must_use]
    pub fn new(base_url: String, hooks_token: String, gateway_token: String, call_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("reqwest client with a fixed timeout always builds");
        Self {
            http,
            base_url,
            hooks_token,
            gateway_token,
        }
    }

    /// Build an [`UpstreamClient`] from a resolved settings snapshot.
    #[must_use]
    pub fn from_settings(settings: &edi_config::Settings) -> Self {
        Self::new(
            settings.upstream_base_url.clone(),
            settings.upstream_hooks_token.clone(),
            settings.upstream_gateway_token.clone(),
            Duration::from_secs(settings.upstream_call_timeout_secs),
        )
    }

    /// Trigger a new upstream session via `/hooks/agent`.
    #[instrument(skip(self, message))]
    pub async fn trigger_agent_hook(
        &self,
        session_key: &str,
        message: &str,
        timeout_seconds: u64,
    ) -> UpstreamResponse {
        let payload = json!({
            "message": message,
            "sessionKey": session_key,
            "name": "EDI-CLI",
            "wakeMode": "now",
            "deliver": false,
            "timeoutSeconds": timeout_seconds,
        });
        self.post("/hooks/agent", &payload, &self.hooks_token).await
    }

    /// Fetch session history via `/tools/invoke` (`sessions_history`).
    #[instrument(skip(self))]
    pub async fn get_session_history(&self, session_key: &str) -> UpstreamResponse {
        let full_key = qualify_session_key(session_key);
        let payload = json!({
            "tool": "sessions_history",
            "args": {
                "sessionKey": full_key,
                "limit": 10,
                "includeTools": false,
            }
        });
        self.post("/tools/invoke", &payload, &self.gateway_token).await
    }

    /// Continue an existing session synchronously via `/tools/invoke`
    /// (`sessions_send`).
    #[instrument(skip(self, message))]
    pub async fn continue_thread(
        &self,
        session_key: &str,
        message: &str,
        timeout_seconds: u64,
    ) -> UpstreamResponse {
        let full_key = qualify_session_key(session_key);
        let payload = json!({
            "tool": "sessions_send",
            "args": {
                "sessionKey": full_key,
                "message": message,
                "timeoutSeconds": timeout_seconds,
            }
        });
        self.post("/tools/invoke", &payload, &self.gateway_token).await
    }

    /// Fire-and-forget dispatch-result callback via `sessions_send`.
    /// Errors are swallowed by the caller; this method still returns the
    /// response so tests can assert on delivery.
    #[instrument(skip(self, message))]
    pub async fn send_dispatch_callback(
        &self,
        session_key: &str,
        message: &str,
        timeout_seconds: u64,
    ) -> UpstreamResponse {
        self.continue_thread(session_key, message, timeout_seconds).await
    }

    async fn post(&self, path: &str, payload: &Value, token: &str) -> UpstreamResponse {
        let url = format!("{}{path}", self.base_url);
        let result = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.json::<UpstreamResponse>().await {
                        Ok(body) => body,
                        Err(err) => {
                            warn!(error = %err, "upstream returned non-JSON body");
                            UpstreamResponse::failure(format!("invalid upstream response: {err}"))
                        }
                    }
                } else {
                    let body = response.text().await.unwrap_or_default();
                    UpstreamResponse::failure(format!("HTTP {}: {body}", status.as_u16()))
                }
            }
            Err(err) => {
                warn!(error = %err, "upstream transport error");
                UpstreamResponse::failure(err.to_string())
            }
        }
    }
}

fn qualify_session_key(session_key: &str) -> String {
    if session_key.starts_with("agent:") {
        session_key.to_string()
    } else {
        format!("{SESSION_NAMESPACE}{session_key}")
    }
}
