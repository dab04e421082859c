//! Shared fixtures: fake probes and a fast config.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use loadprobe_core::error::{LoadProbeError, Result};
use loadprobe_server::app_state::AppState;
use loadprobe_server::config::ServerConfig;
use loadprobe_server::obs::probe::{ResourceProbe, ResourceSample};
use loadprobe_server::obs::ServiceMetrics;
use loadprobe_server::stress::{StressController, WorkUnit};

/// Always returns the same reading.
pub struct FixedProbe(pub ResourceSample);

impl FixedProbe {
    pub fn new() -> Self {
        Self(ResourceSample {
            memory_bytes: 64 * 1024 * 1024,
            cpu_percent: 12.5,
        })
    }
}

#[async_trait]
impl ResourceProbe for FixedProbe {
    async fn read(&self, _window: Duration) -> Result<ResourceSample> {
        Ok(self.0)
    }
}

/// Fails every other read.
#[derive(Default)]
pub struct FlakyProbe {
    calls: AtomicU64,
}

impl FlakyProbe {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResourceProbe for FlakyProbe {
    async fn read(&self, _window: Duration) -> Result<ResourceSample> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n % 2 == 0 {
            Err(LoadProbeError::ResourceRead("simulated failure".into()))
        } else {
            Ok(ResourceSample {
                memory_bytes: 1000 + n,
                cpu_percent: 1.0,
            })
        }
    }
}

/// Small units and short intervals so tests finish quickly.
pub fn fast_config() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    cfg.sampler.interval_ms = 20;
    cfg.sampler.cpu_window_ms = 5;
    cfg.stress.cpu.batch_size = 10_000;
    cfg.stress.cpu.yield_ms = 2;
    cfg.stress.memory.unit_mb = 1;
    cfg.stress.memory.cap_mb = 4;
    cfg.stress.memory.step_interval_ms = 10;
    cfg.latency.home_max_ms = 5;
    cfg.latency.slow_min_ms = 1;
    cfg.latency.slow_max_ms = 5;
    cfg
}

/// Work unit that tracks how many copies run at once.
#[derive(Clone, Default)]
pub struct ConcurrencyGauge {
    in_flight: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    pub fn work_unit(&self) -> WorkUnit {
        let gauge = self.clone();
        Arc::new(move || {
            let now = gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.max_seen.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
        })
    }

    pub fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

pub fn controller(cfg: &ServerConfig, metrics: &ServiceMetrics) -> StressController {
    StressController::new(
        cfg.stress.clone(),
        Arc::new(FixedProbe::new()),
        cfg.sampler.cpu_window(),
        metrics.clone(),
    )
}

/// App state over a fixed probe.
pub fn state() -> AppState {
    AppState::with_probe(fast_config(), Arc::new(FixedProbe::new())).unwrap()
}

pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
