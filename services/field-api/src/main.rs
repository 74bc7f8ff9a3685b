//! Field API Server
//!
//! Renders masked heatmaps, animations and legends from uploaded
//! measurements.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use field_api::create_router;
use field_api::state::{load_config, AppState};

/// Field API Server
#[derive(Parser, Debug)]
#[command(name = "field-api")]
#[command(about = "Heatmap and animation server for scattered measurements")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090", env = "FIELD_LISTEN_ADDR")]
    listen: String,

    /// Pipeline configuration (YAML)
    #[arg(short, long, env = "FIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Boundary GeoJSON, overrides the config file
    #[arg(long, env = "FIELD_BOUNDARY_PATH")]
    boundary: Option<PathBuf>,

    /// Maximum request body in megabytes
    #[arg(long, default_value_t = 32, env = "FIELD_MAX_BODY_MB")]
    max_body_mb: usize,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "FIELD_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Starting field API server");

    let mut config = load_config(args.config.as_deref())?;
    if let Some(boundary) = args.boundary {
        config.boundary_path = boundary;
    }

    let mut state = AppState::new(config)?;
    state.prometheus = Some(prometheus);
    state.body_limit = args.max_body_mb * 1024 * 1024;

    let app = create_router(Arc::new(state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", args.listen))?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
