use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tonegrab_core::{
    load_config, validate_config, ExtractionGateway, JobManager, ServiceGateway, SystemLocator,
    YtDlpService,
};
use tonegrab_server::api::{create_router, WsBroadcaster};
use tonegrab_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if tracing::dispatcher::has_been_set() {
            error!("Fatal error: {:#}", e);
        } else {
            // Config failures happen before the subscriber is installed
            eprintln!("Fatal error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("TONEGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Config is loaded before logging so `logging.json` can pick the layer
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(config.logging.json);
    info!("Loaded configuration from {:?}", config_path);

    validate_config(&config).context("Configuration validation failed")?;

    info!("Output directory: {:?}", config.downloads.output_dir);
    info!(
        "Default format: {} ({})",
        config.downloads.format, config.downloads.quality
    );

    std::fs::create_dir_all(&config.downloads.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {:?}",
            config.downloads.output_dir
        )
    })?;

    // Extraction backend
    let service = YtDlpService::new(config.ytdlp.clone());
    info!("Using extractor binary {:?}", service.config().binary);
    let gateway: Arc<dyn ExtractionGateway> = Arc::new(ServiceGateway::new(service));

    // ffmpeg lookup: configured path, then next to the executable, then PATH
    let bundled_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let locator = SystemLocator::ffmpeg()
        .with_explicit(config.ytdlp.ffmpeg_location.clone())
        .with_bundled_dir(bundled_dir);

    let manager = Arc::new(
        JobManager::from_config(gateway, &config).with_locator(Arc::new(locator)),
    );

    let ws_broadcaster = WsBroadcaster::default();
    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(config, Arc::clone(&manager), ws_broadcaster));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    manager.shutdown().await;
    info!("All jobs stopped");

    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
