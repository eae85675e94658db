use async_trait::async_trait;
use tokio::sync::RwLock;

use devreg_core::device::Device;
use devreg_core::error::Result;

use super::DeviceStore;

/// Ordered device list guarded by an async RwLock.
#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    devices: RwLock<Vec<Device>>,
}

impl InMemoryDeviceStore {
    pub fn new(seed: Vec<Device>) -> Self {
        Self {
            devices: RwLock::new(seed),
        }
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn list(&self) -> Vec<Device> {
        self.devices.read().await.clone()
    }

    async fn create(&self, device: Device) -> usize {
        let mut g = self.devices.write().await;
        g.push(device);
        g.len()
    }

    async fn upgrade(&self, id: i64, firmware: &str) -> Result<usize> {
        let mut g = self.devices.write().await;
        let mut matched = 0;
        for d in g.iter_mut().filter(|d| d.id == id) {
            d.firmware = firmware.to_string();
            matched += 1;
        }
        Ok(matched)
    }

    async fn len(&self) -> usize {
        self.devices.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use devreg_core::device::default_seed;

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = InMemoryDeviceStore::new(default_seed());
        let n = store.create(Device::new(9, "m9", "1.0.0")).await;
        assert_eq!(n, 3);

        let ids: Vec<i64> = store.list().await.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 9]);
    }

    #[tokio::test]
    async fn upgrade_touches_only_matching_ids() {
        let store = InMemoryDeviceStore::new(default_seed());
        assert_eq!(store.upgrade(2, "3.0.0").await.unwrap(), 1);

        let list = store.list().await;
        assert_eq!(list[0].firmware, "2.1.6");
        assert_eq!(list[1].firmware, "3.0.0");
    }

    #[tokio::test]
    async fn upgrade_updates_duplicates() {
        let store = InMemoryDeviceStore::new(vec![
            Device::new(5, "a", "1"),
            Device::new(5, "b", "1"),
        ]);
        assert_eq!(store.upgrade(5, "2").await.unwrap(), 2);
        assert!(store.list().await.iter().all(|d| d.firmware == "2"));
    }

    #[tokio::test]
    async fn upgrade_unknown_id_matches_nothing() {
        let store = InMemoryDeviceStore::new(default_seed());
        assert_eq!(store.upgrade(42, "9.9.9").await.unwrap(), 0);
        assert_eq!(store.list().await, default_seed());
    }
}
