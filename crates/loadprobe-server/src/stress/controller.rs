//! Stress controller.
//!
//! Owns the per-kind on/off state. A kind is active exactly while its slot in
//! `slots` holds a cancellation token; the slot entry lock makes start and
//! stop atomic per kind, so concurrent starts spawn one worker. Nothing here
//! waits for a worker to finish.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use loadprobe_core::error::Result;
use loadprobe_core::{StressAction, StressKind};

use crate::config::StressConfig;
use crate::obs::probe::ResourceProbe;
use crate::obs::ServiceMetrics;
use crate::stress::cpu::{random_batch, CpuWorker, WorkUnit};
use crate::stress::memory::{self, MemoryWorker, SharedBallast};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
}

/// Result of a control request, rendered as the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Start(StressKind, StartOutcome),
    Stop(StressKind, StopOutcome),
}

impl ControlOutcome {
    pub fn message(&self) -> String {
        match self {
            ControlOutcome::Start(kind, StartOutcome::Started) => {
                format!("{} stress started\n", kind.display_name())
            }
            ControlOutcome::Start(kind, StartOutcome::AlreadyRunning) => {
                format!("{} stress already running\n", kind.display_name())
            }
            ControlOutcome::Stop(kind, StopOutcome::Stopped) => {
                format!("{} stress stopped\n", kind.display_name())
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, Serialize)]
pub struct StressStatus {
    pub memory_stress_active: bool,
    pub cpu_stress_active: bool,
    pub allocated_units: usize,
    pub allocated_memory_mb: usize,
    pub cpu_stress_batches: u64,
    /// Direct reading; `None` when the probe failed.
    pub memory_usage_mb: Option<f64>,
    pub cpu_usage_percent: Option<f64>,
}

pub struct StressController {
    slots: DashMap<StressKind, CancellationToken>,
    ballast: SharedBallast,
    cfg: StressConfig,
    work_unit: WorkUnit,
    probe: Arc<dyn ResourceProbe>,
    probe_window: Duration,
    metrics: ServiceMetrics,
}

impl StressController {
    pub fn new(
        cfg: StressConfig,
        probe: Arc<dyn ResourceProbe>,
        probe_window: Duration,
        metrics: ServiceMetrics,
    ) -> Self {
        for kind in StressKind::ALL {
            metrics.stress_active.set(&[kind.as_str()], 0.0);
        }
        metrics.stress_allocated.set(&[], 0.0);

        Self {
            slots: DashMap::new(),
            ballast: SharedBallast::default(),
            work_unit: random_batch(cfg.cpu.batch_size),
            cfg,
            probe,
            probe_window,
            metrics,
        }
    }

    /// Replace the CPU worker's unit of work.
    pub fn with_work_unit(mut self, work_unit: WorkUnit) -> Self {
        self.work_unit = work_unit;
        self
    }

    /// Start the worker for `kind` unless one is already active.
    pub fn start(&self, kind: StressKind) -> StartOutcome {
        match self.slots.entry(kind) {
            Entry::Occupied(_) => {
                tracing::info!(%kind, "stress already running");
                StartOutcome::AlreadyRunning
            }
            Entry::Vacant(slot) => {
                let token = CancellationToken::new();
                self.spawn_worker(kind, token.clone());
                slot.insert(token);
                self.metrics.stress_active.set(&[kind.as_str()], 1.0);
                tracing::info!(%kind, "stress started");
                StartOutcome::Started
            }
        }
    }

    /// Signal the worker for `kind` to stop. For memory, the ballast is
    /// released before this returns. Always reports `Stopped`.
    pub fn stop(&self, kind: StressKind) -> StopOutcome {
        match self.slots.entry(kind) {
            Entry::Occupied(slot) => {
                slot.get().cancel();
                self.release_if_memory(kind);
                slot.remove();
            }
            Entry::Vacant(_) => self.release_if_memory(kind),
        }
        self.metrics.stress_active.set(&[kind.as_str()], 0.0);
        tracing::info!(%kind, "stress stopped");
        StopOutcome::Stopped
    }

    /// Parse `action` and apply it to `kind`. Unknown actions leave state untouched.
    pub fn apply(&self, kind: StressKind, action: &str) -> Result<ControlOutcome> {
        let action: StressAction = action.parse().map_err(|e| {
            tracing::warn!(%kind, action, "invalid stress action");
            e
        })?;
        Ok(match action {
            StressAction::Start => ControlOutcome::Start(kind, self.start(kind)),
            StressAction::Stop => ControlOutcome::Stop(kind, self.stop(kind)),
        })
    }

    /// Stop every kind (used on shutdown).
    pub fn stop_all(&self) {
        for kind in StressKind::ALL {
            self.stop(kind);
        }
    }

    pub fn is_active(&self, kind: StressKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Memory units currently held by the ballast.
    pub fn allocated_units(&self) -> usize {
        memory::lock(&self.ballast).units()
    }

    /// State snapshot plus a direct process reading.
    pub async fn status(&self) -> StressStatus {
        let memory_stress_active = self.is_active(StressKind::Memory);
        let cpu_stress_active = self.is_active(StressKind::Cpu);
        let allocated_units = self.allocated_units();

        let (memory_usage_mb, cpu_usage_percent) = match self.probe.read(self.probe_window).await {
            Ok(sample) => (Some(round2(sample.memory_mb())), Some(round2(sample.cpu_percent))),
            Err(e) => {
                tracing::warn!(error = %e, "status resource read failed");
                (None, None)
            }
        };

        StressStatus {
            memory_stress_active,
            cpu_stress_active,
            allocated_units,
            allocated_memory_mb: allocated_units * self.cfg.memory.unit_mb,
            cpu_stress_batches: self.metrics.cpu_batches.get(&[]),
            memory_usage_mb,
            cpu_usage_percent,
        }
    }

    fn spawn_worker(&self, kind: StressKind, token: CancellationToken) {
        match kind {
            StressKind::Cpu => {
                CpuWorker::new(
                    Arc::clone(&self.work_unit),
                    self.cfg.cpu.yield_interval(),
                    Arc::clone(&self.metrics.cpu_batches),
                )
                .spawn(token);
            }
            StressKind::Memory => {
                MemoryWorker::new(
                    Arc::clone(&self.ballast),
                    self.cfg.memory.unit_bytes(),
                    self.cfg.memory.cap_units(),
                    self.cfg.memory.step_interval(),
                    Arc::clone(&self.metrics.stress_allocated),
                )
                .spawn(token);
            }
        }
    }

    fn release_if_memory(&self, kind: StressKind) {
        if kind != StressKind::Memory {
            return;
        }
        let released = {
            let mut ballast = memory::lock(&self.ballast);
            let units = ballast.units();
            ballast.release();
            self.metrics.stress_allocated.set(&[], 0.0);
            units
        };
        tracing::info!(units = released, "memory ballast released");
    }
}
