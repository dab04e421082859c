//! Logging bootstrap.
//!
//! `RUST_LOG` filters (default `info`). Output goes to stdout and, when
//! `logging.file` is set, is mirrored without ANSI colors to that file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loadprobe_core::error::{LoadProbeError, Result};

use crate::config::LoggingConfig;

pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let file_layer = match &cfg.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoadProbeError::Config(format!("open log file failed ({path}): {e}")))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| LoadProbeError::Internal(format!("logging init failed: {e}")))
}
