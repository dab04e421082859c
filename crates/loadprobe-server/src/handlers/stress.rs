use axum::extract::{Path, State};

use loadprobe_core::StressKind;

use crate::app_state::AppState;
use crate::error::ApiError;

pub async fn memory(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<String, ApiError> {
    control(&state, StressKind::Memory, &action)
}

pub async fn cpu(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<String, ApiError> {
    control(&state, StressKind::Cpu, &action)
}

fn control(state: &AppState, kind: StressKind, action: &str) -> Result<String, ApiError> {
    let outcome = state.controller().apply(kind, action)?;
    Ok(outcome.message())
}
