//! Minimal metrics registry for the server.
//!
//! No metrics crate is used; this module provides counter/gauge/histogram/summary
//! types with declared label names backed by `DashMap`. Labels are flattened into
//! sorted key vectors to keep deterministic ordering. Durations are accumulated in
//! microseconds and rendered in seconds.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::{MetricsSection, Objective};

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", labels)
    }
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let help = help.replace('\\', "\\\\").replace('\n', "\\n");
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

/// Name, help, and the label names every series must carry.
#[derive(Debug)]
struct Desc {
    name: String,
    help: String,
    label_names: Vec<&'static str>,
}

impl Desc {
    fn new(name: &str, help: &str, label_names: &[&'static str]) -> Self {
        let mut label_names = label_names.to_vec();
        label_names.sort_unstable();
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names,
        }
    }

    /// Build the sorted series key. `None` when the label names do not match
    /// the declared set.
    fn key(&self, labels: &[(&str, &str)]) -> Option<LabelKey> {
        let mut key: LabelKey = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();

        let matches = key.len() == self.label_names.len()
            && key.iter().zip(&self.label_names).all(|((k, _), n)| k.as_str() == *n);
        if !matches {
            tracing::warn!(
                metric = %self.name,
                expected = ?self.label_names,
                got = ?labels.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
                "label set mismatch, sample dropped"
            );
            return None;
        }
        Some(key)
    }

    fn is_unlabeled(&self) -> bool {
        self.label_names.is_empty()
    }
}

/// Collect `(key, snapshot)` pairs ordered by label key.
fn sorted_series<V, S>(map: &DashMap<LabelKey, V>, snap: impl Fn(&V) -> S) -> Vec<(LabelKey, S)> {
    let mut series: Vec<(LabelKey, S)> = map
        .iter()
        .map(|r| (r.key().clone(), snap(r.value())))
        .collect();
    series.sort_by(|a, b| a.0.cmp(&b.0));
    series
}

#[derive(Debug)]
pub struct CounterVec {
    desc: Desc,
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn new(name: &str, help: &str, label_names: &[&'static str]) -> Self {
        let desc = Desc::new(name, help, label_names);
        let map = DashMap::new();
        if desc.is_unlabeled() {
            map.insert(Vec::new(), AtomicU64::new(0));
        }
        Self { desc, map }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let Some(key) = self.desc.key(labels) else { return };
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.desc
            .key(labels)
            .and_then(|k| self.map.get(&k).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        let name = &self.desc.name;
        write_header(out, name, &self.desc.help, "counter");
        for (key, val) in sorted_series(&self.map, |c| c.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{} {}", name, braced(&label_str(&key)), val);
        }
    }
}

#[derive(Debug)]
pub struct GaugeVec {
    desc: Desc,
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn new(name: &str, help: &str, label_names: &[&'static str]) -> Self {
        let desc = Desc::new(name, help, label_names);
        let map = DashMap::new();
        if desc.is_unlabeled() {
            map.insert(Vec::new(), AtomicI64::new(0));
        }
        Self { desc, map }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let Some(key) = self.desc.key(labels) else { return };
        let gauge = self.map.entry(key).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    /// Overwrite the value.
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        let Some(key) = self.desc.key(labels) else { return };
        let gauge = self.map.entry(key).or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.desc
            .key(labels)
            .and_then(|k| self.map.get(&k).map(|g| g.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        let name = &self.desc.name;
        write_header(out, name, &self.desc.help, "gauge");
        for (key, val) in sorted_series(&self.map, |g| g.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{} {}", name, braced(&label_str(&key)), val);
        }
    }
}

#[derive(Debug)]
struct AtomicHistogram {
    count: AtomicU64,
    sum_micros: AtomicU64,
    buckets: Vec<AtomicU64>,
}

impl AtomicHistogram {
    fn new(n: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

/// Point-in-time copy of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum_secs: f64,
    /// Cumulative counts, one per configured bound (without `+Inf`).
    pub buckets: Vec<u64>,
}

#[derive(Debug)]
pub struct HistogramVec {
    desc: Desc,
    bounds: Vec<f64>,
    bounds_micros: Vec<u64>,
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// `bounds` are bucket upper bounds in seconds, strictly increasing.
    pub fn new(name: &str, help: &str, label_names: &[&'static str], bounds: &[f64]) -> Self {
        let desc = Desc::new(name, help, label_names);
        let bounds_micros = bounds
            .iter()
            .map(|b| (b * 1_000_000.0).round() as u64)
            .collect();
        let map = DashMap::new();
        if desc.is_unlabeled() {
            map.insert(Vec::new(), AtomicHistogram::new(bounds.len()));
        }
        Self {
            desc,
            bounds: bounds.to_vec(),
            bounds_micros,
            map,
        }
    }

    /// Observe a duration and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let Some(key) = self.desc.key(labels) else { return };

        let n = self.bounds.len();
        let hist = self.map.entry(key).or_insert_with(|| AtomicHistogram::new(n));
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_micros.fetch_add(micros, Ordering::Relaxed);

        // Cumulative: every bucket whose bound is >= the value.
        for (i, &b) in self.bounds_micros.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        let key = self.desc.key(labels)?;
        self.map.get(&key).map(|h| Self::snap(h.value()))
    }

    fn snap(h: &AtomicHistogram) -> HistogramSnapshot {
        HistogramSnapshot {
            count: h.count.load(Ordering::Relaxed),
            sum_secs: micros_to_secs(h.sum_micros.load(Ordering::Relaxed)),
            buckets: h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
        }
    }

    /// Render in Prometheus text exposition format (unit: seconds).
    fn render(&self, out: &mut String) {
        let name = &self.desc.name;
        write_header(out, name, &self.desc.help, "histogram");
        for (key, snap) in sorted_series(&self.map, Self::snap) {
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (le, count) in self.bounds.iter().zip(&snap.buckets) {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, snap.count);
            let _ = writeln!(out, "{}_sum{} {}", name, braced(&labels), snap.sum_secs);
            let _ = writeln!(out, "{}_count{} {}", name, braced(&labels), snap.count);
        }
    }
}

/// Upper bound on samples kept per summary series.
const SUMMARY_WINDOW_CAP: usize = 4096;

#[derive(Debug)]
struct SummaryState {
    count: AtomicU64,
    sum_micros: AtomicU64,
    window: Mutex<VecDeque<(Instant, u64)>>,
}

impl SummaryState {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
            window: Mutex::new(VecDeque::new()),
        }
    }
}

/// Quantiles over a sliding time window.
///
/// Quantiles are computed exactly from the retained samples, so every
/// configured error tolerance is met as long as the window is not saturated.
#[derive(Debug)]
pub struct SummaryVec {
    desc: Desc,
    objectives: Vec<Objective>,
    max_age: Duration,
    map: DashMap<LabelKey, SummaryState>,
}

impl SummaryVec {
    pub fn new(
        name: &str,
        help: &str,
        label_names: &[&'static str],
        objectives: &[Objective],
        max_age: Duration,
    ) -> Self {
        let desc = Desc::new(name, help, label_names);
        let mut objectives = objectives.to_vec();
        objectives.sort_by(|a, b| a.quantile.total_cmp(&b.quantile));
        let map = DashMap::new();
        if desc.is_unlabeled() {
            map.insert(Vec::new(), SummaryState::new());
        }
        Self {
            desc,
            objectives,
            max_age,
            map,
        }
    }

    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        self.observe_at(labels, duration, Instant::now());
    }

    fn observe_at(&self, labels: &[(&str, &str)], duration: Duration, now: Instant) {
        let Some(key) = self.desc.key(labels) else { return };

        let state = self.map.entry(key).or_insert_with(SummaryState::new);
        let micros = duration.as_micros() as u64;
        state.count.fetch_add(1, Ordering::Relaxed);
        state.sum_micros.fetch_add(micros, Ordering::Relaxed);

        // A poisoned lock only means a panic mid-push; the deque is still usable.
        let mut w = state.window.lock().unwrap_or_else(|p| p.into_inner());
        prune(&mut w, now, self.max_age);
        if w.len() >= SUMMARY_WINDOW_CAP {
            w.pop_front();
        }
        w.push_back((now, micros));
    }

    /// `(quantile, seconds)` for each objective; `NaN` when the window is empty.
    pub fn quantiles(&self, labels: &[(&str, &str)]) -> Option<Vec<(f64, f64)>> {
        let key = self.desc.key(labels)?;
        let state = self.map.get(&key)?;
        Some(self.compute(state.value(), Instant::now()))
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.desc
            .key(labels)
            .and_then(|k| self.map.get(&k).map(|s| s.count.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    fn compute(&self, state: &SummaryState, now: Instant) -> Vec<(f64, f64)> {
        let mut samples: Vec<u64> = {
            let mut w = state.window.lock().unwrap_or_else(|p| p.into_inner());
            prune(&mut w, now, self.max_age);
            w.iter().map(|(_, v)| *v).collect()
        };
        samples.sort_unstable();

        self.objectives
            .iter()
            .map(|o| (o.quantile, quantile_of(&samples, o.quantile)))
            .collect()
    }

    fn render(&self, out: &mut String) {
        let name = &self.desc.name;
        write_header(out, name, &self.desc.help, "summary");
        let now = Instant::now();
        let series = sorted_series(&self.map, |s| {
            (
                self.compute(s, now),
                s.count.load(Ordering::Relaxed),
                s.sum_micros.load(Ordering::Relaxed),
            )
        });
        for (key, (quantiles, count, sum)) in series {
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };
            for (q, v) in quantiles {
                let _ = writeln!(out, "{}{{{}quantile=\"{}\"}} {}", name, prefix, q, v);
            }
            let _ = writeln!(out, "{}_sum{} {}", name, braced(&labels), micros_to_secs(sum));
            let _ = writeln!(out, "{}_count{} {}", name, braced(&labels), count);
        }
    }
}

fn prune(w: &mut VecDeque<(Instant, u64)>, now: Instant, max_age: Duration) {
    while let Some((t, _)) = w.front() {
        if now.saturating_duration_since(*t) > max_age {
            w.pop_front();
        } else {
            break;
        }
    }
}

/// Nearest-rank quantile over sorted microsecond samples, in seconds.
fn quantile_of(sorted: &[u64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    micros_to_secs(sorted[idx])
}

/// All metrics exported by one server process.
///
/// Owned by `AppState`; there is no global registry.
#[derive(Debug)]
pub struct ServerMetrics {
    pub connected_devices: GaugeVec,
    pub info: GaugeVec,
    pub upgrades: CounterVec,
    pub request_duration: HistogramVec,
    pub login_duration: SummaryVec,
    draining_name: String,
    draining: AtomicBool,
}

impl ServerMetrics {
    pub fn new(cfg: &MetricsSection) -> Self {
        let ns = &cfg.namespace;
        Self {
            connected_devices: GaugeVec::new(
                &format!("{ns}_connected_devices"),
                "Number of currently connected devices.",
                &[],
            ),
            info: GaugeVec::new(
                &format!("{ns}_info"),
                "Information about the application environment.",
                &["version"],
            ),
            upgrades: CounterVec::new(
                &format!("{ns}_device_upgrade_total"),
                "Number of upgraded devices.",
                &["type"],
            ),
            request_duration: HistogramVec::new(
                &format!("{ns}_request_duration_seconds"),
                "Duration of the request.",
                &["status", "method"],
                &cfg.request_duration_buckets,
            ),
            login_duration: SummaryVec::new(
                &format!("{ns}_login_request_duration_seconds"),
                "Duration of the login request.",
                &[],
                &cfg.login_objectives,
                Duration::from_secs(cfg.summary_max_age_secs),
            ),
            draining_name: format!("{ns}_draining"),
            draining: AtomicBool::new(false),
        }
    }

    /// Mark draining state.
    pub fn set_draining(&self) { self.draining.store(true, Ordering::Relaxed); }
    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool { self.draining.load(Ordering::Relaxed) }

    /// Render every metric in Prometheus text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.connected_devices.render(&mut out);
        self.info.render(&mut out);
        self.upgrades.render(&mut out);
        self.request_duration.render(&mut out);
        self.login_duration.render(&mut out);

        write_header(&mut out, &self.draining_name, "1 while the server is shutting down.", "gauge");
        let _ = writeln!(out, "{} {}", self.draining_name, if self.is_draining() { 1 } else { 0 });
        out
    }
}
