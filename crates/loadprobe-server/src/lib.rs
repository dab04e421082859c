//! loadprobe server library entry.
//!
//! This crate wires the metrics registry, resource sampler, stress workers,
//! and HTTP surface into one service. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod instrument;
pub mod obs;
pub mod ops;
pub mod router;
pub mod stress;
pub mod telemetry;
