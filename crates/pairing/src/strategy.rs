use crate::error::PairingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How functional acquisitions are distributed over fieldmap groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every acquisition goes to the group acquired last in the session
    Last,

    /// Each acquisition goes to the most recent group at or before it,
    /// falling back to the first group
    Closest,

    /// `Last`, applied per task partition
    Task,

    /// Variance-based best pair; recognised but not implemented
    EtaSquared,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Last,
        Strategy::Closest,
        Strategy::Task,
        Strategy::EtaSquared,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::Closest => "closest",
            Self::Task => "task",
            Self::EtaSquared => "eta_squared",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PairingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == value)
            .ok_or_else(|| PairingError::UnknownStrategy(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>(), Ok(strategy));
        }
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        assert_eq!(
            "eta_square".parse::<Strategy>(),
            Err(PairingError::UnknownStrategy("eta_square".to_string()))
        );
    }
}
