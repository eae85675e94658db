#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use devreg_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
metrics:
  listen: "0.0.0.0:9100"
  namespase: "intro" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.api.listen, "0.0.0.0:8080");
    assert_eq!(cfg.metrics.listen, "0.0.0.0:8081");
    assert_eq!(cfg.metrics.namespace, "devreg");
    assert_eq!(cfg.metrics.request_duration_buckets, vec![0.1, 0.15, 0.2, 0.25, 0.3]);
    assert_eq!(cfg.metrics.login_objectives.len(), 3);
    assert_eq!(cfg.devices.len(), 2);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
app:
  version: "1.0.0"
api:
  listen: "127.0.0.1:18080"
metrics:
  listen: "127.0.0.1:18081"
  namespace: "intro"
  request_duration_buckets: [0.05, 0.5]
  login_objectives:
    - { quantile: 0.99, error: 0.001 }
  summary_max_age_secs: 60
devices:
  - { id: 10, mac: "AA-AA-AA-AA-AA-AA", firmware: "1.0.0" }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.app.version, "1.0.0");
    assert_eq!(cfg.api_addr().unwrap().port(), 18080);
    assert_eq!(cfg.metrics_addr().unwrap().port(), 18081);
    assert_eq!(cfg.metrics.namespace, "intro");
    assert_eq!(cfg.metrics.login_objectives[0].quantile, 0.99);
    assert_eq!(cfg.devices.len(), 1);
    assert_eq!(cfg.devices[0].id, 10);
}

#[test]
fn empty_device_list_is_allowed() {
    let cfg = config::load_from_str("version: 1\ndevices: []\n").expect("must parse");
    assert!(cfg.devices.is_empty());
}

#[test]
fn wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn listeners_must_differ() {
    let bad = r#"
version: 1
api: { listen: "0.0.0.0:9000" }
metrics: { listen: "0.0.0.0:9000" }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("must differ"));
}

#[test]
fn listen_must_parse() {
    let err = config::load_from_str("version: 1\napi: { listen: \"localhost\" }\n")
        .expect_err("must fail");
    assert!(err.to_string().contains("api.listen"));
}

#[test]
fn buckets_must_increase() {
    let bad = "version: 1\nmetrics: { request_duration_buckets: [0.1, 0.1, 0.3] }\n";
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("strictly increasing"));

    let bad = "version: 1\nmetrics: { request_duration_buckets: [] }\n";
    assert!(config::load_from_str(bad).is_err());

    let bad = "version: 1\nmetrics: { request_duration_buckets: [-1.0] }\n";
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn objectives_are_checked() {
    let bad = "version: 1\nmetrics: { login_objectives: [{ quantile: 1.5, error: 0.01 }] }\n";
    assert!(config::load_from_str(bad).is_err());

    let bad = "version: 1\nmetrics: { login_objectives: [{ quantile: 0.5, error: 0.0 }] }\n";
    assert!(config::load_from_str(bad).is_err());

    let dup = r#"
version: 1
metrics:
  login_objectives:
    - { quantile: 0.5, error: 0.05 }
    - { quantile: 0.5, error: 0.01 }
"#;
    let err = config::load_from_str(dup).expect_err("must fail");
    assert!(err.to_string().contains("duplicate quantile"));
}

#[test]
fn namespace_must_be_a_metric_name() {
    let bad = "version: 1\nmetrics: { namespace: \"my-app\" }\n";
    assert!(config::load_from_str(bad).is_err());

    let bad = "version: 1\nmetrics: { namespace: \"9lives\" }\n";
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn missing_file_is_internal() {
    let err = config::load_from_file("/nonexistent/devreg.yaml").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}

#[test]
fn seed_device_typo_is_rejected() {
    let bad = r#"
version: 1
devices:
  - { id: 1, mac: "5f-33-CC-1F-43-82", mack: "oops", firmware: "2.1.6" }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    assert!(err.to_string().contains("mack"));
}

#[test]
fn seed_device_needs_every_field() {
    let bad = "version: 1\ndevices:\n  - { id: 1, mac: \"m\" }\n";
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn seed_devices_convert_in_order() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    let seed = cfg.seed_devices();
    assert_eq!(seed.len(), 2);
    assert_eq!(seed[0].id, 1);
    assert_eq!(seed[1].mac, "EF-2B-C4-F5-D6-34");
}
