//! `GET /tasks` and `POST /tasks/<id>/cancel`.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::authenticate;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list_tasks(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"ok": true, "tasks": state.registry.list_running()}))
}

pub async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if task_id.is_empty() {
        return Err(ApiError::BadRequest("task id required".to_string()));
    }

    authenticate(&state, &body, &headers)?;

    let status = state
        .registry
        .request_cancel(&task_id)
        .map_err(|err| match err {
            edi_dispatch::DispatchError::UnknownTask(id) => ApiError::NotFound(format!("unknown task: {id}")),
            other => ApiError::BadRequest(other.to_string()),
        })?;

    Ok(Json(json!({"ok": true, "status": status})))
}
