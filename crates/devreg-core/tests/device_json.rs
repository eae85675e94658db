//! Device wire format tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use devreg_core::device::{default_seed, Device, FirmwareUpgrade};

#[test]
fn device_serializes_with_wire_names() {
    let d = Device::new(7, "AA-BB-CC-DD-EE-FF", "3.0.0");
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(
        v,
        serde_json::json!({ "id": 7, "mac": "AA-BB-CC-DD-EE-FF", "firmware": "3.0.0" })
    );
}

#[test]
fn device_missing_fields_take_zero_values() {
    let d = Device::from_json(br#"{"id": 3, "mac": "x"}"#).unwrap();
    assert_eq!(d, Device::new(3, "x", ""));

    let d = Device::from_json(b"{}").unwrap();
    assert_eq!(d, Device::new(0, "", ""));
}

#[test]
fn device_rejects_wrong_types() {
    let err = Device::from_json(br#"{"id": "three"}"#).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn device_rejects_empty_body() {
    assert!(Device::from_json(b"").is_err());
}

#[test]
fn device_rejects_garbage() {
    let err = Device::from_json(b"not json").expect_err("must fail");
    assert!(err.to_string().starts_with("bad request: invalid device"));
}

#[test]
fn upgrade_ignores_extra_fields() {
    let up = FirmwareUpgrade::from_json(br#"{"id": 1, "mac": "m", "firmware": "2.2.0"}"#).unwrap();
    assert_eq!(up.firmware, "2.2.0");
}

#[test]
fn upgrade_without_firmware_is_empty() {
    let up = FirmwareUpgrade::from_json(br#"{"id": 1}"#).unwrap();
    assert_eq!(up.firmware, "");
}

#[test]
fn upgrade_rejects_garbage() {
    let err = FirmwareUpgrade::from_json(b"[1, 2").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn seed_has_two_demo_devices() {
    let seed = default_seed();
    assert_eq!(seed.len(), 2);
    assert_eq!(seed[0].mac, "5f-33-CC-1F-43-82");
    assert_eq!(seed[1].id, 2);
    assert!(seed.iter().all(|d| d.firmware == "2.1.6"));
}
