//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seats per table in the default configuration.
pub const DEFAULT_MAX_SEATS: usize = 3;

/// Largest per-viewer push buffer. The buffer is allocated up front.
pub const MAX_PUSH_BUFFER: usize = 4096;

/// Table and push configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Maximum number of seated players (default: 3)
    pub max_seats: usize,

    /// Chips of each denomination handed to a seat on join
    pub chips_per_stack: u32,

    /// Pending pushes kept per viewer before the oldest are dropped
    pub push_buffer: usize,

    /// Idle time after which a viewer connection is pinged
    pub keepalive_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_seats: DEFAULT_MAX_SEATS,
            chips_per_stack: 10,
            push_buffer: 32,
            keepalive_secs: 15,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_seats == 0 || self.max_seats > 8 {
            return Err("Max seats must be between 1 and 8".to_string());
        }

        if self.chips_per_stack > 100 {
            return Err("Chips per stack must be at most 100".to_string());
        }

        if self.push_buffer == 0 || self.push_buffer > MAX_PUSH_BUFFER {
            return Err(format!("Push buffer must be between 1 and {MAX_PUSH_BUFFER} events"));
        }

        if self.keepalive_secs == 0 {
            return Err("Keepalive interval must be positive".to_string());
        }

        Ok(())
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_seats, 3);
        assert_eq!(config.keepalive(), Duration::from_secs(15));
    }

    #[test]
    fn test_rejects_zero_seats() {
        let config = TableConfig {
            max_seats: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_push_buffer_bounds() {
        for push_buffer in [0, MAX_PUSH_BUFFER + 1, usize::MAX] {
            let config = TableConfig {
                push_buffer,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {push_buffer}");
        }

        let config = TableConfig {
            push_buffer: MAX_PUSH_BUFFER,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
