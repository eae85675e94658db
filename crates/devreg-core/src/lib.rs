//! devreg core: device model and the error surface shared by the server and
//! any client tooling.
//!
//! This crate carries no transport or runtime dependencies so it can be reused
//! outside the HTTP server.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `DevRegError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod device;
pub mod error;

/// Shared result type.
pub use error::{DevRegError, Result};
pub use device::{Device, FirmwareUpgrade};
