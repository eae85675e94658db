//! Device records as they travel over the wire.
//!
//! Field values are opaque strings: MAC and firmware formats are not checked.
//! Missing fields decode to their zero value; only malformed JSON is rejected.

use serde::{Deserialize, Serialize};

use crate::error::{DevRegError, Result};

/// A registered device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    /// Numeric id. Not required to be unique.
    pub id: i64,
    /// MAC address, e.g. `5f-33-CC-1F-43-82`.
    pub mac: String,
    /// Firmware version string.
    pub firmware: String,
}

impl Device {
    pub fn new(id: i64, mac: impl Into<String>, firmware: impl Into<String>) -> Self {
        Self {
            id,
            mac: mac.into(),
            firmware: firmware.into(),
        }
    }

    /// Decode a device from a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| DevRegError::BadRequest(format!("invalid device: {e}")))
    }
}

/// Body of a firmware upgrade request.
///
/// Unknown fields are ignored so clients may send a whole device document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FirmwareUpgrade {
    pub firmware: String,
}

impl FirmwareUpgrade {
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| DevRegError::BadRequest(format!("invalid upgrade: {e}")))
    }
}

/// Devices every fresh registry starts with.
pub fn default_seed() -> Vec<Device> {
    vec![
        Device::new(1, "5f-33-CC-1F-43-82", "2.1.6"),
        Device::new(2, "EF-2B-C4-F5-D6-34", "2.1.6"),
    ]
}
