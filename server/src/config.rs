use bevy::prelude::*;
use holdout_common::character::SpeedConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Runtime configuration for the dedicated server. Missing fields fall back
/// to the embedded defaults, so a config file only needs the overrides.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on for remote clients.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Speed scalars for every character in this session.
    #[serde(default)]
    pub speeds: SpeedConfig,
}

fn default_listen() -> String {
    "127.0.0.1:4687".to_string()
}

static DEFAULT_CONFIG_FILE: &str = include_str!("default-config.toml");

impl Default for ServerConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_FILE).unwrap()
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }
}

/// An error that occurred when loading the server config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An IO error occurred.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Invalid TOML.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Load the config from `HOLDOUT_CONFIG` (default `holdout-server.toml`) and
/// publish it, along with the speed scalars it carries.
pub fn load_config(mut commands: Commands) {
    let path = std::env::var_os("HOLDOUT_CONFIG")
        .map_or_else(|| PathBuf::from("holdout-server.toml"), PathBuf::from);
    let config = match ServerConfig::load(&path) {
        Ok(config) => {
            info!(?path, "Loaded server config");
            config
        }
        Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!(?path, "No config file, using defaults");
            ServerConfig::default()
        }
        Err(err) => {
            error!(%err, ?path, "Failed to load server config, using defaults");
            ServerConfig::default()
        }
    };
    commands.insert_resource(config.speeds);
    commands.insert_resource(config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.speeds, SpeedConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let config: ServerConfig = toml::from_str("[speeds]\nwalk_speed = 2.0\nsprint_speed = 4.0\n").unwrap();
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.speeds.walk_speed, 2.0);
        assert_eq!(config.speeds.sprint_speed, 4.0);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(toml::from_str::<ServerConfig>("listen = 12").is_err());
    }
}
