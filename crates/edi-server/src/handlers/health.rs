//! `GET /health` and `GET /metrics`.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    server: &'static str,
    version: &'static str,
}

pub async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        server: "edi-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics_handle.render();
    ([("content-type", "text/plain; version=0.0.4")], body).into_response()
}
