//! Device storage.
//!
//! Handlers talk to `DeviceStore`; the in-memory implementation is the only
//! one shipped.

pub mod memory;

use async_trait::async_trait;

use devreg_core::device::Device;
use devreg_core::error::Result;

pub use memory::InMemoryDeviceStore;

#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Snapshot of all devices in insertion order.
    async fn list(&self) -> Vec<Device>;

    /// Append a device. Returns the device count after the insert.
    async fn create(&self, device: Device) -> usize;

    /// Set the firmware of every device carrying `id`.
    /// Returns how many devices matched; zero is not an error.
    async fn upgrade(&self, id: i64, firmware: &str) -> Result<usize>;

    async fn len(&self) -> usize;
}
