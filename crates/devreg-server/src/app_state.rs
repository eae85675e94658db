//! Shared application state for the devreg server.
//!
//! One `AppState` is cloned into both routers: the device API and the metrics
//! listener see the same store and the same metrics.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::obs::ServerMetrics;
use crate::store::{DeviceStore, InMemoryDeviceStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    store: Arc<dyn DeviceStore>,
}

struct AppStateInner {
    cfg: ServerConfig,
    metrics: ServerMetrics,
}

impl AppState {
    /// Build state with the in-memory store seeded from config.
    pub async fn new(cfg: ServerConfig) -> Self {
        let store = Arc::new(InMemoryDeviceStore::new(cfg.seed_devices()));
        Self::with_store(cfg, store).await
    }

    /// Build state around an existing store.
    pub async fn with_store(cfg: ServerConfig, store: Arc<dyn DeviceStore>) -> Self {
        let metrics = ServerMetrics::new(&cfg.metrics);
        metrics.info.set(&[("version", cfg.app.version.as_str())], 1);
        metrics.connected_devices.set(&[], store.len().await as i64);

        Self {
            inner: Arc::new(AppStateInner { cfg, metrics }),
            store,
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &dyn DeviceStore {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }
}
