//! devreg server library entry.
//!
//! Wires config, the device store, the metrics registry and both HTTP routers
//! into one server. Consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod api;
pub mod app_state;
pub mod config;
pub mod listeners;
pub mod obs;
pub mod ops;
pub mod router;
pub mod store;
