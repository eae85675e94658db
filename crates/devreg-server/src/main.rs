//! devreg server binary.
//!
//! - Device API on `api.listen` (default :8080)
//! - Prometheus metrics + health on `metrics.listen` (default :8081)
//!
//! Config path: first argument, else `$DEVREG_CONFIG`, else `devreg.yaml`.

use std::path::Path;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use devreg_core::error::{DevRegError, Result};
use devreg_server::{app_state::AppState, config, config::ServerConfig, listeners};

const DEFAULT_CONFIG: &str = "devreg.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "devreg-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = load_config()?;
    let api_addr = cfg.api_addr()?;
    let metrics_addr = cfg.metrics_addr()?;

    tracing::info!(
        version = %cfg.app.version,
        namespace = %cfg.metrics.namespace,
        devices = cfg.devices.len(),
        "devreg-server starting"
    );

    let state = AppState::new(cfg).await;

    let api = TcpListener::bind(api_addr)
        .await
        .map_err(|e| DevRegError::Internal(format!("bind {api_addr} failed: {e}")))?;
    let metrics = TcpListener::bind(metrics_addr)
        .await
        .map_err(|e| DevRegError::Internal(format!("bind {metrics_addr} failed: {e}")))?;

    listeners::serve(state, api, metrics, listeners::shutdown_signal()).await
}

fn load_config() -> Result<ServerConfig> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DEVREG_CONFIG").ok());

    match explicit {
        Some(path) => config::load_from_file(&path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_from_file(DEFAULT_CONFIG),
        None => {
            tracing::warn!(path = DEFAULT_CONFIG, "config file not found, using defaults");
            Ok(ServerConfig::default())
        }
    }
}
