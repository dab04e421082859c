//! Calculator domain behind `/calc`.
//!
//! Kept here so domain errors (division by zero, unknown operation) surface as
//! `LoadProbeError` values that the server reports as structured payloads.

use std::str::FromStr;

use serde::Serialize;

use crate::error::{LoadProbeError, Result};

/// Message returned for an operation outside the supported set.
pub const INVALID_OPERATION: &str = "Invalid operation. Use add, sub, mul, or div.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl FromStr for CalcOp {
    type Err = LoadProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(CalcOp::Add),
            "sub" => Ok(CalcOp::Sub),
            "mul" => Ok(CalcOp::Mul),
            "div" => Ok(CalcOp::Div),
            _ => Err(LoadProbeError::BadRequest(INVALID_OPERATION.into())),
        }
    }
}

/// Apply `op` to the operands.
pub fn calculate(op: CalcOp, a: f64, b: f64) -> Result<f64> {
    match op {
        CalcOp::Add => Ok(a + b),
        CalcOp::Sub => Ok(a - b),
        CalcOp::Mul => Ok(a * b),
        CalcOp::Div if b == 0.0 => Err(LoadProbeError::DivisionByZero),
        CalcOp::Div => Ok(a / b),
    }
}
