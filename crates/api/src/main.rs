//! SafeDrive - Main Entry Point

use anyhow::Context;
use api::{create_router, init_logging, AppConfig, AppState};
use backend_client::BackendClient;
use camera_capture::DirectoryFrameSource;
use capture_loop::{CaptureLoop, CaptureServices};
use reconciler::{AlertBoard, SessionReconciler};
use std::sync::Arc;
use storage::LocalStore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = AppConfig::path_from_env();
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    init_logging(&config.server.log_level)?;

    info!("=== SafeDrive v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.api.base_url);

    let store = Arc::new(
        LocalStore::open(&config.store_path)
            .with_context(|| format!("opening local store {}", config.store_path.display()))?,
    );
    let client = Arc::new(BackendClient::new(config.api.clone(), store.clone())?);
    let alerts = Arc::new(AlertBoard::default());
    let reconciler = Arc::new(SessionReconciler::new(
        client.clone(),
        store.clone(),
        alerts.clone(),
    ));

    let source = Arc::new(
        DirectoryFrameSource::new(&config.camera.frames_dir)
            .with_jpeg_quality(config.camera.jpeg_quality),
    );
    let capture = CaptureLoop::new(
        config.capture.clone(),
        config.scoring.clone(),
        config.proximity.clone(),
        CaptureServices {
            source,
            overlay: client.clone(),
            depth: client.clone(),
            reconciler: reconciler.clone(),
        },
    )?;

    let state = Arc::new(AppState::new(
        capture,
        store,
        client.clone(),
        client,
        reconciler,
        alerts,
        config.scoring.clone(),
    ));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    info!("Dashboard listening on {}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if state.capture.is_live() {
        let outcome = state.capture.stop_and_commit().await;
        info!("Live episode closed on shutdown: {:?}", outcome);
    }

    info!("SafeDrive stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
