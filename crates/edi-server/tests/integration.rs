//! End-to-end integration tests driving the full `axum::Router` via
//! `tower::ServiceExt::oneshot`. Subprocess-dependent scenarios (a
//! successful dispatch run, a cancellation mid-run) are exercised at the
//! `TaskSupervisor` unit level instead of here, since the real
//! `codex`/`claude`/`gemini` binaries `build_agent_command` targets are not
//! present in a CI sandbox; the closest honest end-to-end equivalent
//! reproducible here is the spawn failure path, which every environment
//! lacking those CLIs hits.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use edi_auth::AuthVerifier;
use edi_config::Settings;
use edi_dispatch::{TaskRegistry, TaskSupervisor};
use edi_server::{build_router, AppState};
use edi_store::ThreadStore;
use edi_upstream::UpstreamClient;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_state(server: &MockServer, settings_override: impl FnOnce(&mut Settings)) -> AppState {
    let threads_dir = tempfile::tempdir().unwrap().keep();
    let mut settings = Settings {
        threads_dir,
        upstream_base_url: server.uri(),
        ask_poll_interval_secs: 0,
        ask_initial_delay_secs: 0,
        ..Settings::default()
    };
    settings_override(&mut settings);
    let settings = Arc::new(settings);

    let store = Arc::new(ThreadStore::new(settings.threads_dir.clone()));
    let registry = Arc::new(TaskRegistry::new());
    let upstream = Arc::new(UpstreamClient::from_settings(&settings));
    let auth = Arc::new(AuthVerifier::from_settings(&settings));
    let supervisor = Arc::new(TaskSupervisor::new(Arc::clone(&store), Arc::clone(&registry), Arc::clone(&upstream)));
    let metrics_handle = Arc::new(metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder().handle());

    AppState {
        settings,
        store,
        registry,
        supervisor,
        upstream,
        auth,
        metrics_handle,
        start_time: Instant::now(),
    }
}

async fn send(router: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: Value = if bytes.is_empty() { json!(null) } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let (status, body) = send(router, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["server"], json!("edi-gateway"));
}

/// S1 — new ask, no reply on first poll, reply on second.
#[tokio::test]
async fn ask_new_thread_polls_until_reply_arrives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "runId": "r1"})))
        .mount(&server)
        .await;

    // wiremock prefers the most-recently-mounted matching mock, so the
    // unlimited fallback is mounted first and the single-shot "no reply yet"
    // mock second — it wins the first poll, then falls through once spent.
    Mock::given(method("POST"))
        .and(path("/tools/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"details": {"messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": [{"type": "text", "text": "hello"}]},
            ]}},
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tools/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"details": {"messages": [{"role": "user", "content": "hi"}]}},
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/ask", json!({"message": "hi"}));
    let (status, body) = send(router, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["reply"], json!("hello"));
    assert_eq!(body["threadId"].as_str().unwrap().len(), 8);
}

/// S2 — continuation via `/ask`, no polling.
#[tokio::test]
async fn ask_continuation_calls_sessions_send_synchronously() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tools/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"details": {"reply": "yo"}},
        })))
        .mount(&server)
        .await;

    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/ask", json!({"message": "hi again", "threadId": "abc123"}));
    let (status, body) = send(router, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "reply": "yo", "threadId": "abc123"}));
}

#[tokio::test]
async fn ask_missing_message_is_bad_request() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/ask", json!({}));
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// S7 — HMAC replay: a signature computed against a stale timestamp is
/// rejected even though the signature itself is internally consistent.
#[tokio::test]
async fn expired_signature_is_rejected() {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let server = MockServer::start().await;
    let state = test_state(&server, |s| s.auth_secret = Some("s3cr3t".to_string())).await;
    let router = build_router(state);

    let body = json!({"message": "hi"});
    let canonical = edi_core::canonicalize(&body);
    let stale_ts = chrono::Utc::now().timestamp() - 600;
    let signing_input = format!("{stale_ts}:{canonical}");

    let mut mac = Hmac::<Sha256>::new_from_slice(b"s3cr3t").unwrap();
    mac.update(signing_input.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let req = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .header("X-EDI-Timestamp", stale_ts.to_string())
        .header("X-EDI-Signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, body) = send(router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().to_lowercase().contains("expired"));
}

#[tokio::test]
async fn dispatch_rejects_missing_agent_and_message() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/dispatch", json!({"threadId": "t1"}));
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dispatch_rejects_unknown_agent() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/dispatch", json!({"agent": "bard", "message": "hi", "threadId": "t1"}));
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// S4-equivalent — when the agent binary cannot be found on `PATH` at all
/// (true in any sandbox without the real `codex`/`claude`/`gemini` CLIs
/// installed), the early-completion window observes a quick `failed`
/// status rather than waiting out the full dispatch timeout.
#[tokio::test]
async fn dispatch_reports_early_failure_when_agent_binary_is_absent() {
    let server = MockServer::start().await;
    let state = test_state(&server, |s| s.dispatch.early_check_secs = 1.0).await;
    let router = build_router(state);

    let req = json_request(
        "POST",
        "/dispatch",
        json!({"agent": "codex", "message": "build it", "threadId": "t1"}),
    );
    let (status, body) = send(router, req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], json!(false));
    assert_eq!(body["threadId"], json!("t1"));
    assert_eq!(body["status"], json!("failed"));
    assert!(body["error"].as_str().is_some());
}

/// S5 — agent binding conflict: a thread already bound to `codex` rejects a
/// `claude` dispatch without writing any new entry.
#[tokio::test]
async fn dispatch_rejects_mismatched_agent_binding() {
    let server = MockServer::start().await;
    let state = test_state(&server, |s| s.dispatch.early_check_secs = 1.0).await;

    state
        .store
        .append("t1", &edi_core::ThreadEntry::agent(1, edi_core::AgentKind::Codex, "hi", Some(0)))
        .unwrap();

    let router = build_router(state.clone());
    let req = json_request("POST", "/dispatch", json!({"agent": "claude", "message": "x", "threadId": "t1"}));
    let (status, body) = send(router, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().to_lowercase().contains("codex"));

    let entries = state.store.load("t1").unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn thread_not_found_is_404() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let (status, _) = send(router, Request::builder().uri("/thread/zzzzzzzz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_without_secret_is_service_unavailable() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/github-webhook")
        .header("content-type", "application/json")
        .body(Body::from(json!({"repository": "neil/nexus"}).to_string()))
        .unwrap();

    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn tasks_list_is_empty_for_fresh_server() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let (status, body) = send(router, Request::builder().uri("/tasks").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"], json!([]));
}

#[tokio::test]
async fn cancel_unknown_task_is_404() {
    let server = MockServer::start().await;
    let state = test_state(&server, |_| {}).await;
    let router = build_router(state);

    let req = json_request("POST", "/tasks/nope/cancel", json!({}));
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
