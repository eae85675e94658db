//! Axum router wiring for both listeners.

use axum::{
    middleware,
    routing::{any, get, put},
    Router,
};

use crate::api::{devices, login, timing};
use crate::{app_state::AppState, ops};

/// Device API: `/devices`, `/devices/<id>`, `/login`.
pub fn build_api_router(state: AppState) -> Router {
    let device_routes = Router::new()
        .route("/devices", get(devices::list_devices).post(devices::create_device))
        .route("/devices/", put(devices::upgrade_device))
        .route("/devices/*rest", put(devices::upgrade_device))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            timing::track_request_duration,
        ));

    let login_routes = Router::new()
        .route("/login", any(login::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), timing::track_login));

    Router::new()
        .merge(device_routes)
        .merge(login_routes)
        .with_state(state)
}

/// Metrics listener: `/metrics`, `/healthz`, `/readyz`.
pub fn build_metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .with_state(state)
}
