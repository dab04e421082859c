//! Process resource probe.
//!
//! `ResourceProbe` is the seam between the sampler/controller and the OS.
//! `SysinfoProbe` reads the current process through `sysinfo`; CPU percent
//! needs two refreshes, so a read spans `window`, never less than
//! `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`.

use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Pid, System};
use tokio::sync::Mutex;

use loadprobe_core::error::{LoadProbeError, Result};

/// One reading of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// Resident set size.
    pub memory_bytes: u64,
    /// CPU utilization over the read window (100 = one full core).
    pub cpu_percent: f64,
}

impl ResourceSample {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn read(&self, window: Duration) -> Result<ResourceSample>;
}

pub struct SysinfoProbe {
    pid: Pid,
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| LoadProbeError::ResourceRead(format!("current pid unavailable: {e}")))?;
        // Baseline so the first read has a previous sample to diff against.
        let mut system = System::new();
        refresh(&mut system, pid)?;
        Ok(Self {
            pid,
            system: Mutex::new(system),
        })
    }
}

fn refresh(system: &mut System, pid: Pid) -> Result<()> {
    system.refresh_cpu();
    if system.refresh_process(pid) {
        Ok(())
    } else {
        Err(LoadProbeError::ResourceRead(format!("process {pid} not found")))
    }
}

#[async_trait]
impl ResourceProbe for SysinfoProbe {
    async fn read(&self, window: Duration) -> Result<ResourceSample> {
        // Serialized so concurrent readers don't shorten each other's CPU window.
        let mut system = self.system.lock().await;
        refresh(&mut system, self.pid)?;
        tokio::time::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        refresh(&mut system, self.pid)?;

        let process = system
            .process(self.pid)
            .ok_or_else(|| LoadProbeError::ResourceRead(format!("process {} vanished", self.pid)))?;
        Ok(ResourceSample {
            memory_bytes: process.memory(),
            cpu_percent: f64::from(process.cpu_usage()),
        })
    }
}
