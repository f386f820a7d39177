//! Radar processing API service.
//!
//! Accepts radar product URLs, processes them on a background worker pool
//! (fetch, decode, render, sample) and serves job status, the rendered
//! overlay, and the sampled point collection over HTTP.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_api::config::ServiceConfig;
use radar_api::handlers;
use radar_api::pipeline;
use radar_api::reaper::ReaperTask;
use radar_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "radar-api")]
#[command(about = "Radar overlay processing API server")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    info!("Starting radar processing API server");

    let config = ServiceConfig::from_env();
    info!(
        retention_hours = config.retention_hours,
        workers = config.pipeline_workers,
        queue_capacity = config.queue_capacity,
        synthetic_decoder = config.synthetic_decoder,
        "Loaded configuration"
    );

    // Create the artifact directory
    tokio::fs::create_dir_all(&config.data_dir).await?;

    // Initialize application state and the pipeline work queue
    let (state, queue_rx) = AppState::new(config)?;

    // Start the worker pool and the reaper
    pipeline::spawn_workers(state.clone(), queue_rx);
    tokio::spawn(ReaperTask::new(state.clone()).run_forever());

    // Parse listen address and serve
    let addr: SocketAddr = args.listen.parse()?;
    handlers::start_server(state, prometheus, addr).await?;

    Ok(())
}
