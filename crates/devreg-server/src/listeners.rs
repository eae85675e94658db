//! Dual-listener serving with a shared graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;

use devreg_core::error::{DevRegError, Result};

use crate::app_state::AppState;
use crate::router::{build_api_router, build_metrics_router};

/// Serve the device API and the metrics endpoint until `shutdown` resolves.
///
/// When `shutdown` fires the draining flag is raised first, then both servers
/// stop accepting and finish in-flight requests. If either server fails the
/// other is dropped and the error is returned.
pub async fn serve<F>(
    state: AppState,
    api: TcpListener,
    metrics: TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = watch::channel(false);
    {
        let state = state.clone();
        tokio::spawn(async move {
            shutdown.await;
            state.set_draining();
            tracing::info!("shutdown requested, draining");
            let _ = tx.send(true);
        });
    }

    let api_addr = local_addr(&api)?;
    let metrics_addr = local_addr(&metrics)?;
    tracing::info!(
        %api_addr,
        %metrics_addr,
        version = %state.cfg().app.version,
        namespace = %state.cfg().metrics.namespace,
        "devreg-server listening"
    );

    let api_app = build_api_router(state.clone())
        .into_make_service_with_connect_info::<SocketAddr>();
    let metrics_app = build_metrics_router(state);

    let api_rx = rx.clone();
    let api_srv = async move {
        axum::serve(api, api_app)
            .with_graceful_shutdown(wait_for_shutdown(api_rx))
            .await
            .map_err(|e| DevRegError::Internal(format!("api server failed: {e}")))
    };
    let metrics_srv = async move {
        axum::serve(metrics, metrics_app)
            .with_graceful_shutdown(wait_for_shutdown(rx))
            .await
            .map_err(|e| DevRegError::Internal(format!("metrics server failed: {e}")))
    };

    run_both(api_srv, metrics_srv).await?;
    tracing::info!("devreg-server stopped");
    Ok(())
}

/// Drive both servers; the first error wins and drops the other one.
async fn run_both<A, M>(api: A, metrics: M) -> Result<()>
where
    A: Future<Output = Result<()>>,
    M: Future<Output = Result<()>>,
{
    tokio::try_join!(api, metrics)?;
    Ok(())
}

fn local_addr(l: &TcpListener) -> Result<SocketAddr> {
    l.local_addr()
        .map_err(|e| DevRegError::Internal(format!("listener has no local addr: {e}")))
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn one_failed_server_stops_the_process() {
        let api = std::future::pending::<Result<()>>();
        let metrics = async { Err(DevRegError::Internal("metrics server failed: boom".into())) };

        let res = tokio::time::timeout(Duration::from_secs(1), run_both(api, metrics))
            .await
            .expect("must not wait for the healthy server");
        let err = res.expect_err("must fail");
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn both_servers_finishing_is_ok() {
        assert!(run_both(async { Ok(()) }, async { Ok(()) }).await.is_ok());
    }

    #[tokio::test]
    async fn shutdown_waiter_sees_earlier_signal() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), wait_for_shutdown(rx))
            .await
            .expect("must return immediately");
    }
}
