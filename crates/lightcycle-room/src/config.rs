//! Room and registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Channel sizing for a room actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Capacity of the room's command mailbox. Senders wait when it fills.
    pub command_channel_size: usize,

    /// Capacity of the steering channel into a running board.
    /// Steering beyond this is dropped with a warning.
    pub steer_channel_size: usize,

    /// Capacity of the outbound broadcast. A subscriber that falls further
    /// behind than this skips the oldest updates.
    pub event_channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            command_channel_size: 64,
            steer_channel_size: 64,
            event_channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Configuration for the room registry actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Capacity of the registry's request mailbox.
    pub channel_size: usize,

    /// How long (in seconds) a room may go without being created or looked
    /// up before the registry forgets it. Rooms with a match in progress
    /// are never forgotten. 0 disables expiry.
    pub idle_ttl_secs: u64,

    /// How often (in seconds) the registry checks for idle rooms.
    pub sweep_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            idle_ttl_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl RegistryConfig {
    /// Idle expiry, or `None` when disabled.
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.command_channel_size, 64);
        assert_eq!(config.steer_channel_size, 64);
        assert_eq!(config.event_channel_size, 64);
    }

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.idle_ttl(), Some(Duration::from_secs(1800)));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = RegistryConfig {
            idle_ttl_secs: 0,
            ..RegistryConfig::default()
        };
        assert_eq!(config.idle_ttl(), None);
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let config = RegistryConfig {
            sweep_interval_secs: 0,
            ..RegistryConfig::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{"idle_ttl_secs": 5}"#).unwrap();
        assert_eq!(config.idle_ttl_secs, 5);
        assert_eq!(config.channel_size, 64);
    }
}
