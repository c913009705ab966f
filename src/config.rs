use serde::Deserialize;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::session::{DurationMinutes, Resolution};

/// Number of sessions held by the registry from startup.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Upper bound on the configurable pool size.
pub const MAX_POOL_SIZE: usize = 16;

/// Real-time length of one simulated second, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Buffered events per subscriber before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Lowest selectable search result rank.
pub const MIN_RESULT_RANK: u8 = 1;

/// Highest selectable search result rank.
pub const MAX_RESULT_RANK: u8 = 10;

/// Remaining seconds at or below which a running countdown is in its final minute.
pub const FINAL_MINUTE_SECONDS: u32 = 60;

/// Top-level configuration for the session engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of sessions created at startup.
    pub pool_size: usize,
    /// Clock period in milliseconds (one tick = one simulated second).
    pub tick_interval_ms: u64,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
    /// Resolution assigned to newly created sessions.
    pub default_resolution: Resolution,
    /// Duration assigned to newly created sessions.
    pub default_duration: DurationMinutes,
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(EngineError::InvalidConfig(format!(
                "pool_size must be in 1..={}, got {}",
                MAX_POOL_SIZE, self.pool_size
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "event_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            default_resolution: Resolution::P720,
            default_duration: DurationMinutes::Five,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.tick_interval_ms, 1000);
    }

    #[test]
    fn test_config_rejects_bad_pool_size() {
        let mut config = EngineConfig::default();
        config.pool_size = 0;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));

        config.pool_size = MAX_POOL_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_tick() {
        let config = EngineConfig {
            tick_interval_ms: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_event_capacity() {
        let config = EngineConfig {
            event_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"pool_size": 3, "default_resolution": "360p"}"#).unwrap();
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.default_resolution, Resolution::P360);
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.default_duration, DurationMinutes::Five);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_duration_must_be_offered_choice() {
        let config: EngineConfig = serde_json::from_str(r#"{"default_duration": 8}"#).unwrap();
        assert_eq!(config.default_duration, DurationMinutes::Eight);

        let parsed = serde_json::from_str::<EngineConfig>(r#"{"default_duration": 7}"#);
        assert!(parsed.is_err());
        let parsed = serde_json::from_str::<EngineConfig>(r#"{"default_resolution": "1080p"}"#);
        assert!(parsed.is_err());
    }
}
