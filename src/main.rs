//! coma-demo
//!
//! Connects to a coma server, keeps the pushed application configuration in a
//! snapshot and serves it over HTTP.
//!
//! ```text
//!   coma server ──ws push──▶ Client ──merge──▶ ArcSwap<DemoConfig> ◀── GET / ── browser
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use coma_client::config::loader::load_config;
use coma_client::lifecycle::signals::wait_for_signal;
use coma_client::observability::logging::{init_logging, LogFormat};
use coma_client::observability::metrics::init_metrics;
use coma_client::{Client, ClientConfig, ObserverStatus};

#[derive(Parser)]
#[command(name = "coma-demo")]
#[command(about = "Serve configuration pushed by a coma server", long_about = None)]
struct Cli {
    /// TOML client configuration; overrides the connection flags below.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "http://localhost:3001/")]
    origin: String,

    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(long, default_value_t = 3001)]
    port: u16,

    #[arg(short, long, default_value = "")]
    key: String,

    /// Connection attempts, first one included.
    #[arg(long, default_value_t = 10)]
    retry: u32,

    #[arg(long, default_value_t = 5000)]
    retry_wait_ms: u64,

    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    #[arg(long)]
    json_logs: bool,
}

/// Application configuration as pushed by the server.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct DemoConfig {
    #[serde(rename = "APPLICATION", default)]
    application: Application,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Application {
    #[serde(rename = "GRACEFUL")]
    graceful: Graceful,
    #[serde(rename = "PRINT_HELLO")]
    print_hello: PrintHello,
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "PORT")]
    port: u16,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Graceful {
    #[serde(rename = "DURATION")]
    duration: String,
    #[serde(rename = "SLEEP_DURATION")]
    sleep_duration: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PrintHello {
    #[serde(rename = "ENABLE")]
    enable: bool,
}

type SharedConfig = Arc<ArcSwap<DemoConfig>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Pretty };
    init_logging("coma_client=info,coma_demo=info,tower_http=info", format);

    if let Some(addr) = cli.metrics_address {
        if let Err(e) = init_metrics(addr) {
            tracing::error!(metrics_address = %addr, error = %e, "Failed to start metrics exporter");
        }
    }

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::new(cli.origin.clone(), cli.host.clone(), cli.port, cli.key.clone())
            .with_retry(cli.retry)
            .with_retry_wait(Duration::from_millis(cli.retry_wait_ms)),
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        attempts = config.retry.attempts,
        wait_ms = config.retry.wait_ms,
        "Connecting to coma server"
    );

    let mut client = Client::new(config).await?;
    let shared: SharedConfig = Arc::new(ArcSwap::from_pointee(DemoConfig::default()));
    client.observe(Arc::clone(&shared))?;

    let mut status = client.status_watch();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if let ObserverStatus::Failed(e) = &*status.borrow() {
                tracing::error!(error = %e, "Configuration updates stopped; serving last known configuration");
            }
        }
    });

    let app = Router::new()
        .route("/", get(handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared);

    let listener = TcpListener::bind(cli.listen).await?;
    tracing::info!(address = %listener.local_addr()?, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    client.shutdown(Duration::from_secs(5)).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn handler(State(shared): State<SharedConfig>) -> Response {
    let config = shared.load_full();
    if config.application.print_hello.enable {
        return "hello world".into_response();
    }
    Json(config.as_ref().clone()).into_response()
}
