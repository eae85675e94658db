//! Lightweight in-process metrics (no metrics crate).
//!
//! Metrics are stored as atomics and rendered by the `/metrics` handler on the
//! metrics listener.

pub mod metrics;

pub use metrics::ServerMetrics;
