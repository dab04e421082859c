//! Request instrumentation middleware.
//!
//! Logs start/completion of every instrumented request and records the
//! request counter and latency histogram. `endpoint` is the matched route
//! template so path parameters don't fan out label sets.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| path.clone());

    tracing::info!(%method, %path, "request started");
    let start = Instant::now();
    let res = next.run(req).await;
    let elapsed = start.elapsed();

    let status = res.status();
    let metrics = state.metrics();
    metrics
        .requests
        .inc(&[method.as_str(), endpoint.as_str(), status.as_str()]);
    metrics
        .request_latency
        .observe(&[method.as_str(), endpoint.as_str()], elapsed);

    tracing::info!(
        %method,
        %path,
        status = status.as_u16(),
        took_ms = elapsed.as_secs_f64() * 1000.0,
        "request complete"
    );
    res
}
