use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rand::Rng;
use serde_json::{json, Value};

use crate::app_state::AppState;

/// Uniform random delay in `[min_ms, max_ms]`.
fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
    Duration::from_millis(ms)
}

pub async fn home(State(state): State<AppState>) -> &'static str {
    let delay = random_delay(0, state.cfg().latency.home_max_ms);
    tokio::time::sleep(delay).await;
    "Load Testing Application\n"
}

pub async fn slow(State(state): State<AppState>) -> String {
    let latency = &state.cfg().latency;
    let delay = random_delay(latency.slow_min_ms, latency.slow_max_ms);
    tokio::time::sleep(delay).await;
    format!("Slow response (delay: {:.2}s)\n", delay.as_secs_f64())
}

pub async fn error() -> (StatusCode, &'static str) {
    tracing::error!("error endpoint called, returning simulated failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Error occurred")
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let stress = state.controller().status().await;
    Json(json!({
        "status": "running",
        "stress_tests": stress,
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}
