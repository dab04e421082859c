//! Request handlers for the load-simulation surface.
//!
//! - `load`: `/`, `/slow`, `/error`, `/status`
//! - `stress`: `/stress/{cpu,memory}/{action}`
//! - `calc`: `/calc`

pub mod calc;
pub mod load;
pub mod stress;
