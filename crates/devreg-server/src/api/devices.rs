use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use devreg_core::device::{Device, FirmwareUpgrade};
use devreg_core::error::DevRegError;

use super::ApiError;
use crate::app_state::AppState;

/// Upgrade counter label value. Every device is currently a router.
const DEVICE_TYPE: &str = "router";

const DEVICE_PREFIX: &str = "/devices/";

pub async fn list_devices(State(app): State<AppState>) -> Response {
    let devices = app.store().list().await;
    (StatusCode::OK, Json(devices)).into_response()
}

pub async fn create_device(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    let device = Device::from_json(&body)?;
    let id = device.id;

    let count = app.store().create(device).await;
    // One create, one increment: independent of how concurrent creates interleave.
    app.metrics().connected_devices.inc(&[]);

    tracing::info!(id, devices = count, "device created");
    Ok((StatusCode::CREATED, "Device created"))
}

/// `PUT /devices/<id>`. Everything after the prefix must be the numeric id,
/// so `/devices/` and `/devices/1/x` are rejected as bad ids.
pub async fn upgrade_device(
    State(app): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    let raw_id = uri.path().strip_prefix(DEVICE_PREFIX).unwrap_or_default();
    let id: i64 = raw_id
        .parse()
        .map_err(|e| DevRegError::BadRequest(format!("invalid device id {raw_id:?}: {e}")))?;
    let req = FirmwareUpgrade::from_json(&body)?;

    let matched = app.store().upgrade(id, &req.firmware).await?;
    app.metrics().upgrades.inc(&[("type", DEVICE_TYPE)]);

    if matched == 0 {
        tracing::warn!(id, "upgrade accepted for unknown device");
    } else {
        tracing::info!(id, firmware = %req.firmware, matched, "device upgrade accepted");
    }
    Ok((StatusCode::ACCEPTED, "Upgrading..."))
}
