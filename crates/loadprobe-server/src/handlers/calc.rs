use axum::extract::Query;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use loadprobe_core::calc::{calculate, CalcOp};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CalcQuery {
    pub op: String,
    pub a: f64,
    pub b: f64,
}

pub async fn calc(Query(q): Query<CalcQuery>) -> Result<Json<Value>, ApiError> {
    tracing::info!(op = %q.op, a = q.a, b = q.b, "calc requested");

    let op: CalcOp = q.op.parse().map_err(|e| {
        tracing::warn!(op = %q.op, "invalid calc operation");
        e
    })?;
    let result = calculate(op, q.a, q.b).map_err(|e| {
        tracing::warn!(error = %e, "calc rejected");
        e
    })?;

    tracing::info!(result, "calc result");
    Ok(Json(json!({ "operation": op, "a": q.a, "b": q.b, "result": result })))
}
