//! `POST /dispatch`: the dispatch acceptance algorithm.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use edi_agent::{build_prompt, parse_agent_kind};
use edi_core::{check_binding, filter_recent, infer_binding, next_turn, validate_thread_id, ThreadEntry};
use edi_dispatch::{SupervisedTask, TaskStatus};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::auth::authenticate;
use crate::errors::ApiError;
use crate::payload::{merge_dispatch_params, synthetic_message_payload, RAW_BODY_CONTENT_TYPES};
use crate::state::AppState;

fn content_type_base(headers: &HeaderMap) -> String {
    headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn resolve_payload(body: Bytes, headers: &HeaderMap, query: &HashMap<String, String>) -> Result<Value, ApiError> {
    let content_type = content_type_base(headers);
    if RAW_BODY_CONTENT_TYPES.contains(&content_type.as_str()) {
        let text = String::from_utf8_lossy(&body).into_owned();
        let mut payload = synthetic_message_payload(&text);
        merge_dispatch_params(&mut payload, query, headers);
        Ok(payload)
    } else {
        if body.is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
    }
}

fn parse_timeout(value: &Value, default: u64) -> Result<u64, ApiError> {
    match value.get("timeout").or_else(|| value.get("timeoutSeconds")) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ApiError::BadRequest("Invalid timeout value".to_string())),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map_err(|_| ApiError::BadRequest("Invalid timeout value".to_string())),
        Some(_) => Err(ApiError::BadRequest("Invalid timeout value".to_string())),
    }
}

fn parse_workdir(value: &Value, default: &std::path::Path) -> Result<PathBuf, ApiError> {
    let workdir = match value.get("workdir").and_then(Value::as_str) {
        Some(raw) if !raw.is_empty() => edi_config::expand_tilde(raw),
        _ => default.to_path_buf(),
    };
    if !workdir.is_dir() {
        return Err(ApiError::BadRequest(format!("workdir not found: {}", workdir.display())));
    }
    Ok(workdir)
}

fn parse_callback_session_key(value: &Value) -> Result<Option<String>, ApiError> {
    match value.get("callback") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(obj.get("sessionKey").and_then(Value::as_str).map(str::to_string)),
        Some(_) => Err(ApiError::BadRequest("callback must be an object".to_string())),
    }
}

/// `POST /dispatch`.
#[instrument(skip(state, headers, body))]
pub async fn dispatch(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(axum::http::StatusCode, axum::Json<Value>), ApiError> {
    let payload = resolve_payload(body, &headers, &query)?;

    authenticate(&state, &payload, &headers)?;

    let agent_raw = payload
        .get("agent")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("agent and message required".to_string()))?;
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("agent and message required".to_string()))?;
    let agent = parse_agent_kind(&agent_raw.to_ascii_lowercase())
        .map_err(|_| ApiError::BadRequest("Unsupported agent".to_string()))?;

    let thread_id = match payload.get("threadId").and_then(Value::as_str) {
        Some(raw) => validate_thread_id(raw)?.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };

    let timeout_seconds = parse_timeout(&payload, state.settings.dispatch.default_timeout_secs)?;
    let workdir = parse_workdir(&payload, &state.settings.dispatch.default_workdir)?;
    let callback_session_key = parse_callback_session_key(&payload)?;

    let entries = state.store.load(&thread_id)?;
    let binding = infer_binding(&entries);
    check_binding(binding, agent)?;

    let filtered = filter_recent(&entries, state.settings.dispatch.max_turns);
    let prompt = build_prompt(&filtered, message, agent);

    let turn = next_turn(&entries);
    let edi_entry = ThreadEntry::edi(turn, message);
    state.store.append(&thread_id, &edi_entry)?;

    let task_id = uuid::Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now().timestamp();
    let cancel = state.registry.create(
        task_id.clone(),
        thread_id.clone(),
        agent.as_str().to_string(),
        started_at,
        workdir.clone(),
        timeout_seconds,
    );

    let task = SupervisedTask {
        task_id: task_id.clone(),
        thread_id: thread_id.clone(),
        turn,
        agent,
        prompt,
        workdir,
        timeout_seconds,
        callback_session_key,
    };

    let supervisor = Arc::clone(&state.supervisor);
    tokio::spawn(async move {
        supervisor.run(task, cancel).await;
    });

    let early_check = Duration::from_secs_f64(state.settings.dispatch.early_check_secs);
    if !early_check.is_zero() {
        tokio::time::sleep(early_check).await;
    }

    match state.registry.get(&task_id) {
        Some(record) if record.status.is_terminal() => {
            if record.status == TaskStatus::Failed {
                let error = record.error.clone().unwrap_or_else(|| "Dispatch failed quickly".to_string());
                Ok((
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({
                        "ok": false,
                        "taskId": task_id,
                        "threadId": thread_id,
                        "status": record.status,
                        "exitCode": record.exit_code,
                        "error": error,
                    })),
                ))
            } else {
                Ok((
                    axum::http::StatusCode::OK,
                    axum::Json(json!({
                        "ok": true,
                        "taskId": task_id,
                        "threadId": thread_id,
                        "status": record.status,
                        "exitCode": record.exit_code,
                    })),
                ))
            }
        }
        Some(record) => Ok((
            axum::http::StatusCode::OK,
            axum::Json(json!({"ok": true, "taskId": task_id, "threadId": thread_id, "status": record.status})),
        )),
        None => {
            warn!(task_id, "task vanished from registry before early-check response");
            Ok((
                axum::http::StatusCode::OK,
                axum::Json(json!({"ok": true, "taskId": task_id, "threadId": thread_id, "status": "running"})),
            ))
        }
    }
}
