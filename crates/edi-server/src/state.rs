//! Shared Axum handler state.

use std::sync::Arc;
use std::time::Instant;

use edi_auth::AuthVerifier;
use edi_config::Settings;
use edi_dispatch::{TaskRegistry, TaskSupervisor};
use edi_store::ThreadStore;
use edi_upstream::UpstreamClient;
use metrics_exporter_prometheus::PrometheusHandle;

/// Everything an Axum handler needs, cloned cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<ThreadStore>,
    pub registry: Arc<TaskRegistry>,
    pub supervisor: Arc<TaskSupervisor>,
    pub upstream: Arc<UpstreamClient>,
    pub auth: Arc<AuthVerifier>,
    pub metrics_handle: Arc<PrometheusHandle>,
    pub start_time: Instant,
}
