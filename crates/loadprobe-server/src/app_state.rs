//! Shared application state.
//!
//! One `StressController` and one set of metric families per process,
//! injected into handlers through axum `State`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use loadprobe_core::error::Result;

use crate::config::ServerConfig;
use crate::obs::probe::{ResourceProbe, SysinfoProbe};
use crate::obs::sampler::Sampler;
use crate::obs::ServiceMetrics;
use crate::stress::StressController;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    metrics: ServiceMetrics,
    probe: Arc<dyn ResourceProbe>,
    controller: StressController,
    sampler_started: AtomicBool,
}

impl AppState {
    /// Build application state backed by the real process probe.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let probe: Arc<dyn ResourceProbe> = Arc::new(SysinfoProbe::new()?);
        Self::with_probe(cfg, probe)
    }

    pub fn with_probe(cfg: ServerConfig, probe: Arc<dyn ResourceProbe>) -> Result<Self> {
        let metrics = ServiceMetrics::new()?;
        let controller = StressController::new(
            cfg.stress.clone(),
            Arc::clone(&probe),
            cfg.sampler.cpu_window(),
            metrics.clone(),
        );
        Ok(Self::from_parts(cfg, metrics, probe, controller))
    }

    /// Assemble from pre-built parts (e.g. a controller with a custom work unit).
    pub fn from_parts(
        cfg: ServerConfig,
        metrics: ServiceMetrics,
        probe: Arc<dyn ResourceProbe>,
        controller: StressController,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                probe,
                controller,
                sampler_started: AtomicBool::new(false),
            }),
        }
    }

    /// Start the resource sampler. Only the first call spawns a task.
    pub fn spawn_sampler(&self) -> Option<JoinHandle<()>> {
        if self.inner.sampler_started.swap(true, Ordering::SeqCst) {
            tracing::warn!("resource sampler already running");
            return None;
        }
        let sampler = Sampler::new(
            Arc::clone(&self.inner.probe),
            self.inner.metrics.clone(),
            self.inner.cfg.sampler.clone(),
        );
        Some(sampler.spawn())
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.inner.metrics
    }

    pub fn controller(&self) -> &StressController {
        &self.inner.controller
    }
}
