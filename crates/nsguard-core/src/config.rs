//! Guard configuration

use std::time::Duration;

use nsguard_common::{DEFAULT_EVENT_CAPACITY, DEFAULT_RELOAD_DELAY_MS};

/// Configuration for the deletion guard
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    /// Delay between the success notification and the reload (default: 1000)
    pub reload_delay_ms: u64,
    /// Capacity of the event bus (default: 256)
    pub event_capacity: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            reload_delay_ms: DEFAULT_RELOAD_DELAY_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl GuardConfig {
    pub fn with_reload_delay(mut self, delay_ms: u64) -> Self {
        self.reload_delay_ms = delay_ms;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GuardConfig::default();
        assert_eq!(config.reload_delay_ms, 1000);
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.reload_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_builder() {
        let config = GuardConfig::default()
            .with_reload_delay(250)
            .with_event_capacity(16);
        assert_eq!(config.reload_delay(), Duration::from_millis(250));
        assert_eq!(config.event_capacity, 16);
    }
}
