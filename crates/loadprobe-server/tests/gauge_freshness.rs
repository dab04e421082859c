//! Runs against the real process probe, alone in its own test binary so
//! other tests don't disturb the RSS readings.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use loadprobe_core::StressKind;
use loadprobe_server::app_state::AppState;
use loadprobe_server::config::ServerConfig;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn memory_gauge_rises_while_memory_stress_runs() {
    let mut cfg = ServerConfig::default();
    cfg.sampler.interval_ms = 200;
    cfg.sampler.cpu_window_ms = 50;
    cfg.stress.memory.unit_mb = 16;
    cfg.stress.memory.cap_mb = 64;
    cfg.stress.memory.step_interval_ms = 50;

    let state = AppState::new(cfg).unwrap();
    let sampler = state.spawn_sampler().unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let before = state.metrics().memory_usage.get(&[]).expect("sampled");

    state.controller().start(StressKind::Memory);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    let after = state.metrics().memory_usage.get(&[]).expect("sampled");

    assert_eq!(state.controller().allocated_units(), 4);
    assert!(after > before, "before={before} after={after}");

    state.controller().stop(StressKind::Memory);
    sampler.abort();
}
