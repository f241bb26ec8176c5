//! `GET /thread/<id>`.

use axum::extract::{Path, State};
use axum::Json;
use edi_core::validate_thread_id;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn get_thread(State(state): State<AppState>, Path(thread_id): Path<String>) -> Result<Json<Value>, ApiError> {
    validate_thread_id(&thread_id)?;

    if !state.store.exists(&thread_id)? {
        return Err(ApiError::NotFound(format!("thread not found: {thread_id}")));
    }

    let entries = state.store.load(&thread_id)?;
    Ok(Json(json!({"ok": true, "threadId": thread_id, "entries": entries})))
}
