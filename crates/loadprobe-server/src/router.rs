//! Axum router wiring.
//!
//! Load-simulation routes sit behind the request instrumentation layer;
//! `/metrics` and `/health` are merged outside it so scrapes are not counted.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, handlers, instrument, ops};

pub fn build_router(state: AppState) -> Router {
    let instrumented = Router::new()
        .route("/", get(handlers::load::home))
        .route("/slow", get(handlers::load::slow))
        .route("/error", get(handlers::load::error))
        .route("/status", get(handlers::load::status))
        .route("/stress/memory/:action", get(handlers::stress::memory))
        .route("/stress/cpu/:action", get(handlers::stress::cpu))
        .route("/calc", get(handlers::calc::calc))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            instrument::track_requests,
        ));

    Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/health", get(ops::health))
        .merge(instrumented)
        .with_state(state)
}
