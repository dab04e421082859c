//! loadprobe server
//!
//! Synthetic load-and-telemetry harness:
//! - variable latency (`/`, `/slow`) and error (`/error`) endpoints
//! - CPU / memory stress workers under `/stress/{cpu,memory}/{start,stop}`
//! - Prometheus metrics on `/metrics`, fed by a 1s resource sampler

use std::process::ExitCode;

use loadprobe_core::error::{LoadProbeError, Result};
use loadprobe_server::config::{self, ConfigSource, ServerConfig};
use loadprobe_server::{app_state, router, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    let (cfg, source) = match config::load_from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("loadprobe: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = telemetry::init(&cfg.logging) {
        eprintln!("loadprobe: {e}");
        return ExitCode::FAILURE;
    }

    match run(cfg, source).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "loadprobe failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: ServerConfig, source: ConfigSource) -> Result<()> {
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    state.spawn_sampler();
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %source, "loadprobe starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| LoadProbeError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LoadProbeError::Internal(format!("server failed: {e}")))?;

    state.controller().stop_all();
    tracing::info!("loadprobe stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
