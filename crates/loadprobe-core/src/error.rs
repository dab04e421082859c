//! Shared error type across loadprobe crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Stress control action outside {start, stop}.
    InvalidAction,
    /// Calculator asked to divide by zero.
    DivisionByZero,
    /// Process resource read failed.
    ResourceUnavailable,
    /// Configuration rejected at startup.
    InvalidConfig,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidAction => "INVALID_ACTION",
            ClientCode::DivisionByZero => "DIVISION_BY_ZERO",
            ClientCode::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            ClientCode::InvalidConfig => "INVALID_CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// Whether the caller is at fault (maps to a 4xx status).
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ClientCode::BadRequest | ClientCode::InvalidAction | ClientCode::DivisionByZero
        )
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LoadProbeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum LoadProbeError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("cannot divide by zero")]
    DivisionByZero,
    #[error("resource read failed: {0}")]
    ResourceRead(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl LoadProbeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            LoadProbeError::BadRequest(_) => ClientCode::BadRequest,
            LoadProbeError::InvalidAction(_) => ClientCode::InvalidAction,
            LoadProbeError::DivisionByZero => ClientCode::DivisionByZero,
            LoadProbeError::ResourceRead(_) => ClientCode::ResourceUnavailable,
            LoadProbeError::Config(_) => ClientCode::InvalidConfig,
            LoadProbeError::Internal(_) => ClientCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(LoadProbeError::InvalidAction("x".into()).client_code().is_client_error());
        assert!(LoadProbeError::DivisionByZero.client_code().is_client_error());
        assert!(!LoadProbeError::ResourceRead("x".into()).client_code().is_client_error());
        assert!(!LoadProbeError::Internal("x".into()).client_code().is_client_error());
    }
}
