//! `POST /ask`.

use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use edi_dispatch::{ask_continue_thread, ask_new_thread, generate_ask_thread_id};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::authenticate;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: Option<String>,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
}

pub async fn ask(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let request: AskRequest = serde_json::from_value(body.clone())
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))?;

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("message required".to_string()))?;

    authenticate(&state, &body, &headers)?;

    let timeout_seconds = request.timeout_seconds.unwrap_or(state.settings.ask_default_timeout_secs);

    let (reply, thread_id) = match request.thread_id {
        None => {
            let thread_id = generate_ask_thread_id();
            let reply = ask_new_thread(
                &state.upstream,
                &thread_id,
                &message,
                timeout_seconds,
                Duration::from_secs(state.settings.ask_poll_interval_secs),
                Duration::from_secs(state.settings.ask_initial_delay_secs),
            )
            .await?;
            (reply, thread_id)
        }
        Some(thread_id) => {
            let reply = ask_continue_thread(&state.upstream, &thread_id, &message, timeout_seconds).await?;
            (reply, thread_id)
        }
    };

    Ok(Json(json!({"ok": true, "reply": reply, "threadId": thread_id})))
}
