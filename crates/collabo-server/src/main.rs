//! Collabo - identity and workspace access-control service

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use collabo_api::{AppState, MetricsHandle, create_router, panic_response};
use collabo_db::Database;
use config::{BootstrapConfig, Config, CorsConfig, LoggingConfig, Overrides};

/// Collabo - identity and workspace access-control service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    config.apply_overrides(&args.overrides);

    // Initialize logging
    init_logging(&config.logging);

    config.validate()?;

    info!(
        "Starting Collabo v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // Initialize database
    if let Some(dir) = config.database.data_dir() {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    let db = Database::new(&config.database.url).await?;

    // Wire the auth core
    let state = AppState::new(db, &config.auth_config())?;
    bootstrap_admin(&state, &config.bootstrap).await?;

    // Metrics recorder
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(MetricsHandle::new(handle)))
    } else {
        None
    };

    // Create router
    let app = create_router(state, metrics_handle)
        .layer(build_cors(&config.cors)?)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the configured SUPER_ADMIN account if it does not exist yet
async fn bootstrap_admin(state: &AppState, bootstrap: &BootstrapConfig) -> Result<()> {
    let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password) else {
        return Ok(());
    };

    let admin = state
        .auth
        .ensure_super_admin(email, &bootstrap.admin_name, password)
        .await
        .context("Failed to bootstrap admin account")?;
    info!("Bootstrap admin ready: {}", admin.email);
    Ok(())
}

/// Build the CORS layer
///
/// A wildcard origin cannot be combined with credentials, so `*` drops them.
fn build_cors(cors: &CorsConfig) -> Result<CorsLayer> {
    let methods = cors
        .allowed_methods
        .iter()
        .map(|m| {
            m.parse::<Method>()
                .with_context(|| format!("Invalid CORS method: {}", m))
        })
        .collect::<Result<Vec<_>>>()?;

    let layer = CorsLayer::new()
        .allow_methods(methods)
        .max_age(Duration::from_secs(cors.max_age_secs));

    if cors.allowed_origins.iter().any(|o| o == "*") {
        if cors.allow_credentials {
            warn!("CORS allows any origin; credentials are disabled");
        }
        return Ok(layer.allow_origin(Any).allow_headers(Any));
    }

    let origins = cors
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer
        .allow_origin(origins)
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(cors.allow_credentials))
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
