//! Whole-game configuration, loadable from a TOML file.

use std::path::Path;

use lightcycle_board::BoardConfig;
use lightcycle_room::{Registry, RegistryConfig, RoomConfig};
use serde::{Deserialize, Serialize};

use crate::LightcycleError;

/// Top-level configuration. Every section and field is optional in the
/// file; missing ones take their defaults.
///
/// ```toml
/// [board]
/// size = 40
/// ticks_per_second = 15
///
/// [registry]
/// idle_ttl_secs = 600
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board used by `set_board` when the caller doesn't pick one.
    pub board: BoardConfig,
    pub room: RoomConfig,
    pub registry: RegistryConfig,
}

impl GameConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, LightcycleError> {
        let mut config: Self = toml::from_str(text)?;
        config.board = config.board.validated();
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LightcycleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LightcycleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Spawns a room registry using the `room` and `registry` sections.
    /// Must be called inside a Tokio runtime.
    pub fn spawn_registry(&self) -> Registry {
        Registry::spawn(self.registry.clone(), self.room.clone())
    }
}
