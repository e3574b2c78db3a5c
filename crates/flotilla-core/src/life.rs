//! Lifecycle and status value enums.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Entity lifecycle. Transitions are monotonic: Alive -> Dying -> Dead,
/// never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Life {
    Alive,
    Dying,
    Dead,
}

impl Life {
    /// The external, observable spelling (`"alive" | "dying" | "dead"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Life::Alive => "alive",
            Life::Dying => "dying",
            Life::Dead => "dead",
        }
    }
}

impl fmt::Display for Life {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workload/agent status as reported through the status-setting endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Pending,
    Started,
    Stopped,
    Down,
    Error,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Pending => "pending",
            EntityStatus::Started => "started",
            EntityStatus::Stopped => "stopped",
            EntityStatus::Down => "down",
            EntityStatus::Error => "error",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn life_ordering_is_monotonic() {
        assert!(Life::Alive < Life::Dying);
        assert!(Life::Dying < Life::Dead);
    }

    #[test]
    fn life_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Life::Dying).unwrap(), "\"dying\"");
        let back: Life = serde_json::from_str("\"dead\"").unwrap();
        assert_eq!(back, Life::Dead);
    }

    #[test]
    fn status_display() {
        assert_eq!(EntityStatus::Started.to_string(), "started");
    }
}
