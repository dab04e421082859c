//! Server config loader (strict parsing).

pub mod schema;

use std::fmt;
use std::fs;
use std::io::ErrorKind;

use loadprobe_core::error::{LoadProbeError, Result};

pub use schema::{
    CpuStressConfig, LatencyConfig, LoggingConfig, MemoryStressConfig, SamplerConfig,
    ServerConfig, ServerSection, StressConfig,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LOADPROBE_CONFIG";
/// Config file used when `LOADPROBE_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "loadprobe.yaml";

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| LoadProbeError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| LoadProbeError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Where the active config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => f.write_str(path),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Resolve the config for this process.
///
/// An explicitly named file must exist. The default file is optional; when it
/// is absent the built-in defaults apply.
pub fn load_from_env() -> Result<(ServerConfig, ConfigSource)> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => Ok((load_from_file(&path)?, ConfigSource::File(path))),
        Err(_) => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(s) => Ok((load_from_str(&s)?, ConfigSource::File(DEFAULT_CONFIG_PATH.into()))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Ok((ServerConfig::default(), ConfigSource::Defaults))
            }
            Err(e) => Err(LoadProbeError::Config(format!(
                "read config failed ({DEFAULT_CONFIG_PATH}): {e}"
            ))),
        },
    }
}
