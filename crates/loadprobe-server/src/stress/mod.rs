//! Stress workers and the controller that owns their lifecycle.
//!
//! - `cpu`: busy-computes one work unit at a time on the blocking pool
//! - `memory`: grows a ballast of fixed-size blocks up to a cap
//! - `controller`: per-kind on/off state, idempotent start/stop, status
//!
//! Workers are fire-and-forget. The controller keeps each worker's
//! `CancellationToken`, never its task handle; workers check the token once
//! per unit of work.

pub mod controller;
pub mod cpu;
pub mod memory;

pub use controller::{ControlOutcome, StartOutcome, StopOutcome, StressController, StressStatus};
pub use cpu::{random_batch, CpuWorker, WorkUnit};
pub use memory::{Ballast, MemoryWorker, SharedBallast};
