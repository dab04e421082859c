//! Stress control vocabulary.
//!
//! `StressKind` names a worker type; `StressAction` is the parsed control verb
//! taken from the request path. Anything other than `start`/`stop` is an
//! explicit `InvalidAction` error, never a silent no-op.

use std::fmt;
use std::str::FromStr;

use crate::error::{LoadProbeError, Result};

/// Which background stress worker a control operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StressKind {
    Cpu,
    Memory,
}

impl StressKind {
    pub const ALL: [StressKind; 2] = [StressKind::Cpu, StressKind::Memory];

    /// Lowercase identifier used in paths, metric labels, and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StressKind::Cpu => "cpu",
            StressKind::Memory => "memory",
        }
    }

    /// Human label used in response bodies ("CPU stress started").
    pub fn display_name(self) -> &'static str {
        match self {
            StressKind::Cpu => "CPU",
            StressKind::Memory => "Memory",
        }
    }
}

impl fmt::Display for StressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StressKind {
    type Err = LoadProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(StressKind::Cpu),
            "memory" => Ok(StressKind::Memory),
            other => Err(LoadProbeError::BadRequest(format!("unknown stress kind: {other}"))),
        }
    }
}

/// Control verb for a stress kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressAction {
    Start,
    Stop,
}

impl FromStr for StressAction {
    type Err = LoadProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(StressAction::Start),
            "stop" => Ok(StressAction::Stop),
            other => Err(LoadProbeError::InvalidAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientCode;

    #[test]
    fn parses_known_actions() {
        assert_eq!("start".parse::<StressAction>().ok(), Some(StressAction::Start));
        assert_eq!("stop".parse::<StressAction>().ok(), Some(StressAction::Stop));
    }

    #[test]
    fn unknown_action_is_explicit_error() {
        let err = "bogus".parse::<StressAction>().err();
        assert!(matches!(err, Some(LoadProbeError::InvalidAction(ref a)) if a == "bogus"));
        assert_eq!(err.map(|e| e.client_code()), Some(ClientCode::InvalidAction));
    }

    #[test]
    fn actions_are_case_sensitive() {
        assert!("START".parse::<StressAction>().is_err());
    }

    #[test]
    fn kind_round_trips_through_its_label() {
        for kind in StressKind::ALL {
            assert_eq!(kind.as_str().parse::<StressKind>().ok(), Some(kind));
        }
    }
}
