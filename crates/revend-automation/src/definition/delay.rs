//! Delay node definition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit of a configured delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayUnit {
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl DelayUnit {
    /// Returns the number of seconds in one unit.
    pub const fn seconds(&self) -> u64 {
        match self {
            DelayUnit::Minutes => 60,
            DelayUnit::Hours => 3_600,
            DelayUnit::Days => 86_400,
        }
    }
}

/// Delay node payload: how long to suspend the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayDef {
    /// Number of units to wait.
    pub amount: u64,
    /// The unit of the delay.
    pub unit: DelayUnit,
}

impl DelayDef {
    /// Creates a new delay definition.
    pub const fn new(amount: u64, unit: DelayUnit) -> Self {
        Self { amount, unit }
    }

    /// Returns the configured delay as a duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.amount.saturating_mul(self.unit.seconds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_as_duration() {
        assert_eq!(
            DelayDef::new(30, DelayUnit::Minutes).as_duration(),
            Duration::from_secs(1_800)
        );
        assert_eq!(
            DelayDef::new(24, DelayUnit::Hours).as_duration(),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            DelayDef::new(2, DelayUnit::Days).as_duration(),
            Duration::from_secs(172_800)
        );
    }

    #[test]
    fn test_delay_overflow_saturates() {
        let delay = DelayDef::new(u64::MAX, DelayUnit::Days);
        assert_eq!(delay.as_duration(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_delay_serde() {
        let delay = DelayDef::new(24, DelayUnit::Hours);
        let json = serde_json::to_string(&delay).expect("serialization failed");
        assert_eq!(json, r#"{"amount":24,"unit":"hours"}"#);
    }
}
