//! uilens-server binary
//!
//! Automated UI screenshot assessment: element detection, UX critique, and
//! downloadable PDF reports behind a small web form.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uilens_server::assessment::GeminiAssessor;
use uilens_server::config::Config;
use uilens_server::detection::RemoteDetector;
use uilens_server::routes;
use uilens_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uilens_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting uilens-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Detection endpoint: {} (model {})",
        config.detection.api_url,
        config.detection.model_id
    );
    tracing::info!(
        "Assessment endpoint: {} (model {})",
        config.assessment.api_url,
        config.assessment.model
    );

    // Wire the hosted providers
    let detector = Arc::new(RemoteDetector::new(config.detection.clone()));
    let assessor = Arc::new(GeminiAssessor::new(config.assessment.clone()));

    // Create application state and start the expiry sweep
    let state = AppState::new(config.clone(), detector, assessor);
    state.store().clone().start_cleanup_task();

    // Build router
    let app = routes::router(state);

    // Start server with graceful shutdown
    let host: IpAddr = config
        .server
        .host
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("uilens-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
