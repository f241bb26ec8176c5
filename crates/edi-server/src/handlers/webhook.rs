//! `POST /github-webhook`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use edi_dispatch::handle_webhook;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn github_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ApiError> {
    let signature = headers.get("X-Hub-Signature-256").and_then(|v| v.to_str().ok());

    let outcome = handle_webhook(
        &state.auth,
        &state.upstream,
        &body,
        signature,
        state.settings.ask_default_timeout_secs,
    )
    .await?;

    Ok(Json(json!({
        "ok": true,
        "message": "webhook accepted",
        "runId": outcome.run_id,
        "sessionKey": outcome.session_key,
    })))
}
