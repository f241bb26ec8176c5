//! Shared request-signing check for the signed routes (`/ask`, `/dispatch`,
//! cancel). Authentication is applied **after** body parsing so the HMAC
//! covers the parsed object.

use axum::http::HeaderMap;
use serde_json::Value;

use crate::errors::ApiError;
use crate::state::AppState;

pub fn authenticate(state: &AppState, body: &Value, headers: &HeaderMap) -> Result<(), ApiError> {
    let timestamp = headers.get("X-EDI-Timestamp").and_then(|v| v.to_str().ok());
    let signature = headers.get("X-EDI-Signature").and_then(|v| v.to_str().ok());
    let now = chrono::Utc::now().timestamp();

    state.auth.verify_request(body, timestamp, signature, now)?;
    Ok(())
}
