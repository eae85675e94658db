use std::net::SocketAddr;

use serde::Deserialize;
use devreg_core::device::{default_seed, Device};
use devreg_core::error::{DevRegError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub app: AppSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    /// Devices the registry starts with.
    #[serde(default = "default_seed_devices")]
    pub devices: Vec<SeedDevice>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DevRegError::UnsupportedVersion);
        }

        let api = parse_listen("api.listen", &self.api.listen)?;
        let metrics = parse_listen("metrics.listen", &self.metrics.listen)?;
        if api == metrics {
            return Err(DevRegError::BadRequest(
                "api.listen and metrics.listen must differ".into(),
            ));
        }

        self.app.validate()?;
        self.metrics.validate()?;

        Ok(())
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        parse_listen("api.listen", &self.api.listen)
    }

    pub fn metrics_addr(&self) -> Result<SocketAddr> {
        parse_listen("metrics.listen", &self.metrics.listen)
    }

    /// Seed list as registry devices.
    pub fn seed_devices(&self) -> Vec<Device> {
        self.devices.iter().cloned().map(Device::from).collect()
    }
}

/// A device entry in the config file.
///
/// Unlike request bodies, every field is required and typos are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDevice {
    pub id: i64,
    pub mac: String,
    pub firmware: String,
}

impl From<SeedDevice> for Device {
    fn from(d: SeedDevice) -> Self {
        Device::new(d.id, d.mac, d.firmware)
    }
}

fn default_seed_devices() -> Vec<SeedDevice> {
    default_seed()
        .into_iter()
        .map(|d| SeedDevice {
            id: d.id,
            mac: d.mac,
            firmware: d.firmware,
        })
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            app: AppSection::default(),
            api: ApiSection::default(),
            metrics: MetricsSection::default(),
            devices: default_seed_devices(),
        }
    }
}

fn parse_listen(field: &str, s: &str) -> Result<SocketAddr> {
    s.parse()
        .map_err(|e| DevRegError::BadRequest(format!("{field} must be a valid SocketAddr: {e}")))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Exported as the `version` label of the info metric.
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: default_app_version(),
        }
    }
}

impl AppSection {
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(DevRegError::BadRequest("app.version must not be empty".into()));
        }
        Ok(())
    }
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default = "default_api_listen")]
    pub listen: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            listen: default_api_listen(),
        }
    }
}

fn default_api_listen() -> String {
    "0.0.0.0:8080".into()
}

/// One summary quantile target and its allowed rank error.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Objective {
    pub quantile: f64,
    pub error: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_listen")]
    pub listen: String,

    /// Metric name prefix (`<namespace>_<name>`).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Upper bounds in seconds for the request duration histogram.
    #[serde(default = "default_request_duration_buckets")]
    pub request_duration_buckets: Vec<f64>,

    #[serde(default = "default_login_objectives")]
    pub login_objectives: Vec<Objective>,

    #[serde(default = "default_summary_max_age_secs")]
    pub summary_max_age_secs: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            listen: default_metrics_listen(),
            namespace: default_namespace(),
            request_duration_buckets: default_request_duration_buckets(),
            login_objectives: default_login_objectives(),
            summary_max_age_secs: default_summary_max_age_secs(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !is_metric_name(&self.namespace) {
            return Err(DevRegError::BadRequest(
                "metrics.namespace must match [a-zA-Z_][a-zA-Z0-9_]*".into(),
            ));
        }

        if self.request_duration_buckets.is_empty() {
            return Err(DevRegError::BadRequest(
                "metrics.request_duration_buckets must not be empty".into(),
            ));
        }
        for b in &self.request_duration_buckets {
            if !b.is_finite() || *b <= 0.0 {
                return Err(DevRegError::BadRequest(format!(
                    "metrics.request_duration_buckets: {b} is not a positive finite number"
                )));
            }
        }
        if self.request_duration_buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DevRegError::BadRequest(
                "metrics.request_duration_buckets must be strictly increasing".into(),
            ));
        }

        for (i, o) in self.login_objectives.iter().enumerate() {
            if !(o.quantile > 0.0 && o.quantile < 1.0) {
                return Err(DevRegError::BadRequest(format!(
                    "metrics.login_objectives[{i}].quantile must be in (0, 1)"
                )));
            }
            if !(o.error > 0.0 && o.error < 1.0) {
                return Err(DevRegError::BadRequest(format!(
                    "metrics.login_objectives[{i}].error must be in (0, 1)"
                )));
            }
            if self.login_objectives[..i].iter().any(|p| p.quantile == o.quantile) {
                return Err(DevRegError::BadRequest(format!(
                    "metrics.login_objectives: duplicate quantile {}",
                    o.quantile
                )));
            }
        }

        if !(10..=3600).contains(&self.summary_max_age_secs) {
            return Err(DevRegError::BadRequest(
                "metrics.summary_max_age_secs must be between 10 and 3600".into(),
            ));
        }
        Ok(())
    }
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_metrics_listen() -> String {
    "0.0.0.0:8081".into()
}
fn default_namespace() -> String {
    "devreg".into()
}
fn default_request_duration_buckets() -> Vec<f64> {
    vec![0.1, 0.15, 0.2, 0.25, 0.3]
}
fn default_login_objectives() -> Vec<Objective> {
    vec![
        Objective { quantile: 0.5, error: 0.05 },
        Objective { quantile: 0.9, error: 0.01 },
        Objective { quantile: 0.99, error: 0.001 },
    ]
}
fn default_summary_max_age_secs() -> u64 {
    600
}
