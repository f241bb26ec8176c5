//! Axum route table and middleware stack: outermost layers execute first
//! on the request, last on the response.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{ask, dispatch, health, tasks, thread, webhook};
use crate::state::AppState;

/// Generates UUIDv4 request ids for the `x-request-id` response header.
#[derive(Clone)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        axum::http::HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build the full Axum router with all routes and the shared middleware
/// stack. `max_request_bytes` comes from [`crate::state::AppState::settings`]
/// rather than a hardcoded constant so tests can shrink the cap.
pub fn build_router(state: AppState) -> Router {
    let max_request_bytes = state.settings.max_request_bytes;

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{id}/cancel", post(tasks::cancel_task))
        .route("/thread/{id}", get(thread::get_thread))
        .route("/ask", post(ask::ask))
        .route("/dispatch", post(dispatch::dispatch))
        .route("/github-webhook", post(webhook::github_webhook))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(max_request_bytes))
        // A generous backstop only: `/ask` legitimately runs as long as the
        // caller's own `timeoutSeconds`, so this may not cut shorter than
        // any bound already enforced inside the handlers themselves.
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, Duration::from_secs(600)))
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(PropagateRequestIdLayer::x_request_id())
}
