use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sortarr_core::{
    load_config, validate_config, DownloadQueue, LibrqbitEngine, Notifier, TorrentEngine,
};
use sortarr_server::api::{create_router, WsBroadcaster};
use sortarr_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SORTARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Movies root: {:?}", config.library.movies_root);
    info!("Shows root: {:?}", config.library.shows_root);
    info!("Upload staging: {:?}", config.uploads.dir);

    // Broadcaster first, every notification fans out through it
    let ws_broadcaster = WsBroadcaster::default();
    let notifier = Notifier::new(Arc::new(ws_broadcaster.clone()));

    info!(
        "Initializing embedded librqbit engine (download path: {})",
        config.engine.download_path
    );
    let engine: Arc<dyn TorrentEngine> = Arc::new(
        LibrqbitEngine::new(&config.engine)
            .await
            .context("Failed to initialize librqbit engine")?,
    );

    let queue = DownloadQueue::from_config(engine, notifier.clone(), &config);
    info!("Download queue ready");

    let state = Arc::new(AppState::new(config.clone(), queue, ws_broadcaster));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    notifier.notify(format!("Server running on http://{}", addr));

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
