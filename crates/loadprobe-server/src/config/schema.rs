use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use loadprobe_core::error::{LoadProbeError, Result};

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub stress: StressConfig,

    #[serde(default)]
    pub latency: LatencyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            sampler: SamplerConfig::default(),
            stress: StressConfig::default(),
            latency: LatencyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(LoadProbeError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.sampler.validate()?;
        self.stress.cpu.validate()?;
        self.stress.memory.validate()?;
        self.latency.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            LoadProbeError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    #[serde(default = "default_sampler_interval_ms")]
    pub interval_ms: u64,

    /// CPU utilization is measured across this window; it is part of the interval.
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sampler_interval_ms(),
            cpu_window_ms: default_cpu_window_ms(),
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.interval_ms) {
            return Err(LoadProbeError::Config(
                "sampler.interval_ms must be between 100 and 60000".into(),
            ));
        }
        if self.cpu_window_ms == 0 || self.cpu_window_ms >= self.interval_ms {
            return Err(LoadProbeError::Config(
                "sampler.cpu_window_ms must be non-zero and less than interval_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }
}

fn default_sampler_interval_ms() -> u64 {
    1000
}
fn default_cpu_window_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StressConfig {
    #[serde(default)]
    pub cpu: CpuStressConfig,

    #[serde(default)]
    pub memory: MemoryStressConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CpuStressConfig {
    /// Pseudo-random values generated per unit of work.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_yield_ms")]
    pub yield_ms: u64,
}

impl Default for CpuStressConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            yield_ms: default_yield_ms(),
        }
    }
}

impl CpuStressConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100_000_000).contains(&self.batch_size) {
            return Err(LoadProbeError::Config(
                "stress.cpu.batch_size must be between 1 and 100000000".into(),
            ));
        }
        if self.yield_ms > 1000 {
            return Err(LoadProbeError::Config(
                "stress.cpu.yield_ms must be at most 1000".into(),
            ));
        }
        Ok(())
    }

    pub fn yield_interval(&self) -> Duration {
        Duration::from_millis(self.yield_ms)
    }
}

fn default_batch_size() -> usize {
    1_000_000
}
fn default_yield_ms() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStressConfig {
    #[serde(default = "default_unit_mb")]
    pub unit_mb: usize,

    #[serde(default = "default_cap_mb")]
    pub cap_mb: usize,

    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

impl Default for MemoryStressConfig {
    fn default() -> Self {
        Self {
            unit_mb: default_unit_mb(),
            cap_mb: default_cap_mb(),
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

impl MemoryStressConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1024).contains(&self.unit_mb) {
            return Err(LoadProbeError::Config(
                "stress.memory.unit_mb must be between 1 and 1024".into(),
            ));
        }
        if self.cap_mb < self.unit_mb || self.cap_mb > 16 * 1024 {
            return Err(LoadProbeError::Config(
                "stress.memory.cap_mb must be at least unit_mb and at most 16384".into(),
            ));
        }
        if self.step_interval_ms == 0 {
            return Err(LoadProbeError::Config(
                "stress.memory.step_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn unit_bytes(&self) -> usize {
        self.unit_mb * MIB
    }

    /// Units the ballast grows to: allocation continues while the held
    /// total is below `cap_mb`, so a partial last unit rounds up.
    pub fn cap_units(&self) -> usize {
        self.cap_mb.div_ceil(self.unit_mb)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

fn default_unit_mb() -> usize {
    10
}
fn default_cap_mb() -> usize {
    100
}
fn default_step_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencyConfig {
    /// Upper bound of the random delay on `/`.
    #[serde(default = "default_home_max_ms")]
    pub home_max_ms: u64,

    #[serde(default = "default_slow_min_ms")]
    pub slow_min_ms: u64,

    #[serde(default = "default_slow_max_ms")]
    pub slow_max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            home_max_ms: default_home_max_ms(),
            slow_min_ms: default_slow_min_ms(),
            slow_max_ms: default_slow_max_ms(),
        }
    }
}

impl LatencyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.slow_min_ms > self.slow_max_ms {
            return Err(LoadProbeError::Config(
                "latency.slow_min_ms must not exceed slow_max_ms".into(),
            ));
        }
        if self.home_max_ms > 60_000 || self.slow_max_ms > 60_000 {
            return Err(LoadProbeError::Config(
                "latency delays must be at most 60000 ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_home_max_ms() -> u64 {
    500
}
fn default_slow_min_ms() -> u64 {
    1000
}
fn default_slow_max_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Mirror log output to this file in addition to stdout.
    #[serde(default)]
    pub file: Option<String>,
}
