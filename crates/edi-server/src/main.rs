//! Process entrypoint: parse CLI, load settings, wire up the gateway, serve.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use edi_auth::AuthVerifier;
use edi_dispatch::{TaskRegistry, TaskSupervisor};
use edi_server::cli::{Cli, LogFormat};
use edi_server::{build_router, observability, AppState};
use edi_store::ThreadStore;
use edi_upstream::UpstreamClient;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    observability::init_subscriber(cli.log_format == LogFormat::Json);

    let mut settings = edi_config::load_settings();
    cli.apply(&mut settings);
    edi_config::init_settings(settings.clone());
    let settings = Arc::new(settings);

    let metrics_handle = Arc::new(observability::install_recorder());

    std::fs::create_dir_all(&settings.threads_dir).expect("failed to create threads directory");
    let store = Arc::new(ThreadStore::new(settings.threads_dir.clone()));
    let registry = Arc::new(TaskRegistry::new());
    let upstream = Arc::new(UpstreamClient::from_settings(&settings));
    let auth = Arc::new(AuthVerifier::from_settings(&settings));
    let supervisor = Arc::new(TaskSupervisor::new(Arc::clone(&store), Arc::clone(&registry), Arc::clone(&upstream)));

    let state = AppState {
        settings: Arc::clone(&settings),
        store,
        registry,
        supervisor,
        upstream,
        auth,
        metrics_handle,
        start_time: Instant::now(),
    };

    let router = build_router(state);

    let addr = format!("{}:{}", settings.listen_host, settings.listen_port);
    let listener = TcpListener::bind(&addr).await.expect("failed to bind listen address");
    let bound_addr = listener.local_addr().expect("failed to read bound address");
    info!(addr = %bound_addr, "edi-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("edi-server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    info!("shutdown signal received");
}
