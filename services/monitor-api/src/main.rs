//! Forest-Watch Monitor API
//!
//! HTTP proxy surface over the data-resolution facade.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use monitor_api::state::AppState;
use providers::ReqwestFetch;
use resolver::{CapabilityManager, ExecutionContext, ForestDataService};

/// Monitor API server
#[derive(Parser, Debug)]
#[command(name = "monitor-api")]
#[command(about = "Forest monitoring data proxy")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090", env = "MONITOR_LISTEN_ADDR")]
    listen: String,

    /// Path to the durable settings document
    #[arg(
        long,
        default_value = "config/settings.yaml",
        env = "MONITOR_SETTINGS_PATH"
    )]
    settings: String,

    /// Optional upstream proxy base for chains that cannot call direct
    #[arg(long, env = "MONITOR_PROXY_BASE")]
    proxy_base: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "MONITOR_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
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
        .context("failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("starting monitor-api");

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    // The server is itself the proxy for restricted clients, so its own
    // chains call upstreams directly unless an outer proxy is configured.
    let context = ExecutionContext {
        can_call_direct: true,
        proxy_base: args.proxy_base.clone(),
    };
    let capability = Arc::new(CapabilityManager::load(&args.settings, context));
    let service = ForestDataService::new(capability.clone(), Arc::new(ReqwestFetch::default()));

    let state = Arc::new(AppState::new(service, capability, Some(metrics_handle)));
    let app = monitor_api::build_router(state);

    let addr: SocketAddr = args.listen.parse().context("invalid listen address")?;
    info!(%addr, "monitor-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
