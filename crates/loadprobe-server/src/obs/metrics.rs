//! In-process metrics registry rendered in Prometheus text format.
//!
//! Families are registered once with a name, help text, and label names; the
//! returned `Arc` is the handle callers record through. Each family keeps its
//! label sets in a `DashMap` keyed by the label values, so concurrent writers
//! only contend on a shard. Counter and histogram cells are atomics; gauges
//! store `f64` bits in an `AtomicU64` so the last write wins without tearing.
//! Histogram buckets are fixed in microseconds to avoid floating point
//! accumulation; they are rendered in seconds.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use loadprobe_core::error::{LoadProbeError, Result};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Label names of a family plus the key-building rules shared by all kinds.
#[derive(Debug)]
struct LabelSet {
    family: String,
    names: Vec<String>,
}

impl LabelSet {
    fn new(family: &str, names: &[&str]) -> Self {
        Self {
            family: family.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Build the map key, or `None` when the arity does not match.
    fn key(&self, values: &[&str]) -> Option<Vec<String>> {
        if values.len() != self.names.len() {
            tracing::warn!(
                metric = %self.family,
                expected = self.names.len(),
                got = values.len(),
                "label arity mismatch, sample dropped"
            );
            return None;
        }
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    /// `k1="v1",k2="v2"` (no braces).
    fn render(&self, values: &[String]) -> String {
        self.names
            .iter()
            .zip(values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

/// Snapshot a family's cells in label order so output is deterministic.
fn sorted_keys<V>(map: &DashMap<Vec<String>, V>) -> Vec<Vec<String>> {
    let mut keys: Vec<Vec<String>> = map.iter().map(|r| r.key().clone()).collect();
    keys.sort();
    keys
}

#[derive(Debug)]
pub struct CounterVec {
    labels: LabelSet,
    map: DashMap<Vec<String>, AtomicU64>,
}

impl CounterVec {
    fn new(name: &str, label_names: &[&str]) -> Self {
        Self {
            labels: LabelSet::new(name, label_names),
            map: DashMap::new(),
        }
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) {
        self.add(values, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, values: &[&str], v: u64) {
        let Some(key) = self.labels.key(values) else { return };
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set (0 if never touched).
    pub fn get(&self, values: &[&str]) -> u64 {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.map
            .get(&key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in sorted_keys(&self.map) {
            let Some(cell) = self.map.get(&key) else { continue };
            let val = cell.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{} {}", name, braced(&self.labels.render(&key)), val);
        }
    }
}

#[derive(Debug)]
pub struct GaugeVec {
    labels: LabelSet,
    map: DashMap<Vec<String>, AtomicU64>,
}

impl GaugeVec {
    fn new(name: &str, label_names: &[&str]) -> Self {
        Self {
            labels: LabelSet::new(name, label_names),
            map: DashMap::new(),
        }
    }

    /// Overwrite the current value (last write wins).
    pub fn set(&self, values: &[&str], v: f64) {
        let Some(key) = self.labels.key(values) else { return };
        let gauge = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        gauge.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Current value for a label set, `None` if never set.
    pub fn get(&self, values: &[&str]) -> Option<f64> {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.map
            .get(&key)
            .map(|g| f64::from_bits(g.load(Ordering::Relaxed)))
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in sorted_keys(&self.map) {
            let Some(cell) = self.map.get(&key) else { continue };
            let val = f64::from_bits(cell.load(Ordering::Relaxed));
            let _ = writeln!(out, "{}{} {}", name, braced(&self.labels.render(&key)), val);
        }
    }
}

/// Request latency buckets in microseconds
/// (5ms .. 10s, the usual client-library defaults).
pub const LATENCY_BUCKETS_MICROS: [u64; 14] = [
    5_000, 10_000, 25_000, 50_000, 75_000, 100_000, 250_000, 500_000, 750_000,
    1_000_000, 2_500_000, 5_000_000, 7_500_000, 10_000_000,
];

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

fn micros_as_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

#[derive(Debug)]
pub struct HistogramVec {
    labels: LabelSet,
    bounds_micros: Vec<u64>,
    map: DashMap<Vec<String>, AtomicHistogram>,
}

impl HistogramVec {
    fn new(name: &str, label_names: &[&str], bounds_micros: &[u64]) -> Self {
        let mut bounds = bounds_micros.to_vec();
        bounds.sort_unstable();
        bounds.dedup();
        Self {
            labels: LabelSet::new(name, label_names),
            bounds_micros: bounds,
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets.
    pub fn observe(&self, values: &[&str], duration: Duration) {
        let Some(key) = self.labels.key(values) else { return };
        let n = self.bounds_micros.len();
        let hist = self.map.entry(key).or_insert_with(|| AtomicHistogram::new(n));
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_micros.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in self.bounds_micros.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for a label set.
    pub fn count(&self, values: &[&str]) -> u64 {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.map
            .get(&key)
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in sorted_keys(&self.map) {
            let Some(hist) = self.map.get(&key) else { continue };
            let label_str = self.labels.render(&key);
            let prefix = if label_str.is_empty() { String::new() } else { format!("{label_str},") };

            for (i, &le) in self.bounds_micros.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    micros_as_secs(le),
                    count
                );
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = micros_as_secs(hist.sum_micros.load(Ordering::Relaxed));
            let _ = writeln!(out, "{}_sum{} {}", name, braced(&label_str), sum);
            let _ = writeln!(out, "{}_count{} {}", name, braced(&label_str), count);
        }
    }
}

#[derive(Debug, Clone)]
enum Instrument {
    Counter(Arc<CounterVec>),
    Gauge(Arc<GaugeVec>),
    Histogram(Arc<HistogramVec>),
}

impl Instrument {
    fn type_name(&self) -> &'static str {
        match self {
            Instrument::Counter(_) => "counter",
            Instrument::Gauge(_) => "gauge",
            Instrument::Histogram(_) => "histogram",
        }
    }
}

#[derive(Debug)]
struct Family {
    name: String,
    help: String,
    instrument: Instrument,
}

/// Registry of metric families, rendered in registration order.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    families: RwLock<Vec<Family>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Arc<CounterVec>> {
        let vec = Arc::new(CounterVec::new(name, label_names));
        self.register(name, help, Instrument::Counter(Arc::clone(&vec)))?;
        Ok(vec)
    }

    pub fn gauge(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Arc<GaugeVec>> {
        let vec = Arc::new(GaugeVec::new(name, label_names));
        self.register(name, help, Instrument::Gauge(Arc::clone(&vec)))?;
        Ok(vec)
    }

    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        bounds_micros: &[u64],
    ) -> Result<Arc<HistogramVec>> {
        let vec = Arc::new(HistogramVec::new(name, label_names, bounds_micros));
        self.register(name, help, Instrument::Histogram(Arc::clone(&vec)))?;
        Ok(vec)
    }

    fn register(&self, name: &str, help: &str, instrument: Instrument) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
            return Err(LoadProbeError::Internal(format!("invalid metric name: {name:?}")));
        }
        let mut families = self.families.write().unwrap_or_else(PoisonError::into_inner);
        if families.iter().any(|f| f.name == name) {
            return Err(LoadProbeError::Internal(format!("metric already registered: {name}")));
        }
        families.push(Family {
            name: name.to_string(),
            help: help.to_string(),
            instrument,
        });
        Ok(())
    }

    /// Render every registered family in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let families = self.families.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::new();
        for f in families.iter() {
            let _ = writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help));
            let _ = writeln!(out, "# TYPE {} {}", f.name, f.instrument.type_name());
            match &f.instrument {
                Instrument::Counter(c) => c.render(&f.name, &mut out),
                Instrument::Gauge(g) => g.render(&f.name, &mut out),
                Instrument::Histogram(h) => h.render(&f.name, &mut out),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected() {
        let reg = MetricsRegistry::new();
        assert!(reg.counter("x_total", "x", &[]).is_ok());
        assert!(reg.gauge("x_total", "x", &[]).is_err());
    }

    #[test]
    fn arity_mismatch_drops_sample() {
        let reg = MetricsRegistry::new();
        let c = reg.counter("req_total", "requests", &["method", "status"]).unwrap();
        c.inc(&["GET"]);
        c.inc(&["GET", "200"]);
        assert_eq!(c.get(&["GET", "200"]), 1);
        assert!(!reg.render().contains("req_total{method=\"GET\"}"));
    }

    #[test]
    fn gauge_is_last_write_wins() {
        let reg = MetricsRegistry::new();
        let g = reg.gauge("mem_bytes", "memory", &[]).unwrap();
        assert_eq!(g.get(&[]), None);
        g.set(&[], 10.0);
        g.set(&[], 4.5);
        assert_eq!(g.get(&[]), Some(4.5));
        assert!(reg.render().contains("mem_bytes 4.5\n"));
    }

    #[test]
    fn histogram_renders_cumulative_buckets_in_seconds() {
        let reg = MetricsRegistry::new();
        let h = reg
            .histogram("lat_seconds", "latency", &["endpoint"], &[10_000, 100_000])
            .unwrap();
        h.observe(&["/"], Duration::from_millis(5));
        h.observe(&["/"], Duration::from_millis(50));
        h.observe(&["/"], Duration::from_millis(500));

        let out = reg.render();
        assert!(out.contains("# TYPE lat_seconds histogram"));
        assert!(out.contains("lat_seconds_bucket{endpoint=\"/\",le=\"0.01\"} 1"));
        assert!(out.contains("lat_seconds_bucket{endpoint=\"/\",le=\"0.1\"} 2"));
        assert!(out.contains("lat_seconds_bucket{endpoint=\"/\",le=\"+Inf\"} 3"));
        assert!(out.contains("lat_seconds_sum{endpoint=\"/\"} 0.555"));
        assert!(out.contains("lat_seconds_count{endpoint=\"/\"} 3"));
        assert_eq!(h.count(&["/"]), 3);
    }

    #[test]
    fn label_values_are_escaped() {
        let reg = MetricsRegistry::new();
        let c = reg.counter("esc_total", "escaping", &["path"]).unwrap();
        c.inc(&["a\"b"]);
        assert!(reg.render().contains("esc_total{path=\"a\\\"b\"} 1"));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let reg = MetricsRegistry::new();
        let c = reg.counter("hits_total", "hits", &["k"]).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc(&["a"]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(&["a"]), 8000);
    }
}
