//! Observability: metrics registry, process resource probe, and the
//! background sampler that feeds the resource gauges.

pub mod metrics;
pub mod probe;
pub mod sampler;

use std::sync::Arc;

use loadprobe_core::error::Result;

use metrics::{CounterVec, GaugeVec, HistogramVec, MetricsRegistry, LATENCY_BUCKETS_MICROS};

/// Metric families exported by the service.
#[derive(Debug, Clone)]
pub struct ServiceMetrics {
    registry: Arc<MetricsRegistry>,
    pub requests: Arc<CounterVec>,
    pub request_latency: Arc<HistogramVec>,
    pub memory_usage: Arc<GaugeVec>,
    pub cpu_usage: Arc<GaugeVec>,
    pub stress_active: Arc<GaugeVec>,
    pub stress_allocated: Arc<GaugeVec>,
    pub cpu_batches: Arc<CounterVec>,
    pub sampler_errors: Arc<CounterVec>,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        Ok(Self {
            requests: registry.counter(
                "load_app_requests_total",
                "Total app HTTP requests",
                &["method", "endpoint", "status"],
            )?,
            request_latency: registry.histogram(
                "load_app_request_latency_seconds",
                "Request latency in seconds",
                &["method", "endpoint"],
                &LATENCY_BUCKETS_MICROS,
            )?,
            memory_usage: registry.gauge("load_app_memory_usage_bytes", "Memory usage in bytes", &[])?,
            cpu_usage: registry.gauge("load_app_cpu_usage_percent", "CPU usage in percent", &[])?,
            stress_active: registry.gauge(
                "load_app_stress_active",
                "Whether a stress worker kind is active (1) or not (0)",
                &["kind"],
            )?,
            stress_allocated: registry.gauge(
                "load_app_stress_allocated_bytes",
                "Bytes held by the memory stress ballast",
                &[],
            )?,
            cpu_batches: registry.counter(
                "load_app_cpu_stress_batches_total",
                "CPU stress work units completed",
                &[],
            )?,
            sampler_errors: registry.counter(
                "load_app_sampler_errors_total",
                "Resource sampling cycles skipped after a read failure",
                &[],
            )?,
            registry,
        })
    }

    /// Prometheus text exposition of every family.
    pub fn render(&self) -> String {
        self.registry.render()
    }
}
