//! loadprobe core: transport-agnostic stress control types, error types, and
//! the calculator domain.
//!
//! This crate defines the vocabulary shared by the server and any tooling that
//! drives it. It intentionally carries no transport or runtime dependencies so
//! it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `LoadProbeError`/`Result` so a bad
//! request never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod calc;
pub mod error;
pub mod stress;

/// Shared result type.
pub use error::{Result, LoadProbeError};
pub use stress::{StressAction, StressKind};
