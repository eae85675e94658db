//! Device API served on the api listener.
//!
//! - `GET  /devices`     : list devices (JSON)
//! - `POST /devices`     : register a device
//! - `PUT  /devices/<id>`: upgrade firmware
//! - `/login`            : demo login endpoint, timed by a summary

pub mod devices;
pub mod error;
pub mod login;
pub mod timing;

pub use error::ApiError;
