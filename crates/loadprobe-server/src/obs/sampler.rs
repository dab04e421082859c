//! Resource sampler.
//!
//! One task started at boot writes process memory and CPU into the resource
//! gauges every interval. The read, CPU window included, is spent inside the
//! interval, so the task sleeps only for the remainder. A failed read is
//! logged, counted, and skipped; nothing ends the loop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::SamplerConfig;
use crate::obs::probe::ResourceProbe;
use crate::obs::ServiceMetrics;

pub struct Sampler {
    probe: Arc<dyn ResourceProbe>,
    metrics: ServiceMetrics,
    cfg: SamplerConfig,
}

impl Sampler {
    pub fn new(probe: Arc<dyn ResourceProbe>, metrics: ServiceMetrics, cfg: SamplerConfig) -> Self {
        Self { probe, metrics, cfg }
    }

    /// Spawn the sampling loop onto the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Take one sample and publish it. Returns whether the read succeeded.
    pub async fn sample_once(&self) -> bool {
        match self.probe.read(self.cfg.cpu_window()).await {
            Ok(sample) => {
                self.metrics.memory_usage.set(&[], sample.memory_bytes as f64);
                self.metrics.cpu_usage.set(&[], sample.cpu_percent);
                tracing::trace!(
                    memory_bytes = sample.memory_bytes,
                    cpu_percent = sample.cpu_percent,
                    "resource sample"
                );
                true
            }
            Err(e) => {
                self.metrics.sampler_errors.inc(&[]);
                tracing::warn!(error = %e, "resource sample failed, skipping cycle");
                false
            }
        }
    }

    async fn run(self) {
        tracing::info!(
            interval_ms = self.cfg.interval_ms,
            cpu_window_ms = self.cfg.cpu_window_ms,
            "resource sampler started"
        );
        let interval = self.cfg.interval();
        loop {
            let started = Instant::now();
            self.sample_once().await;
            tokio::time::sleep(interval.saturating_sub(started.elapsed())).await;
        }
    }
}
