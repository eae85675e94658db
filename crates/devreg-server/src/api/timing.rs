//! Request timing middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

/// Observe the request duration histogram, labelled by status and method.
pub async fn track_request_duration(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let start = Instant::now();

    let res = next.run(req).await;

    app.metrics().request_duration.observe(
        &[("status", res.status().as_str()), ("method", method.as_str())],
        start.elapsed(),
    );
    res
}

/// Observe the login summary and write an access log line.
pub async fn track_login(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    // Absent when the router is driven without a socket (tests).
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let start = Instant::now();

    let res = next.run(req).await;

    let elapsed = start.elapsed();
    app.metrics().login_duration.observe(&[], elapsed);
    tracing::info!(
        %method,
        %path,
        remote = ?remote,
        status = res.status().as_u16(),
        ?elapsed,
        "request"
    );
    res
}
