//! Server configuration file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish::ServerSettings;
use skirmish_arena::ArenaOptions;
use tracing::info;

/// Default config path when `SKIRMISH_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "skirmish.toml";

/// Root configuration: a `[server]` and an `[arena]` table, both optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub arena: ArenaOptions,
}

impl Config {
    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.arena.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use skirmish_arena::{ColorPolicy, Point, SpawnOverflow};

    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load("definitely/not/here.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::parse(
            r#"
            [server]
            bind = "127.0.0.1:4000"

            [arena]
            max_clients = 4
            colors_length = 4
            color_policy = "random-nonunique"
            spawn_overflow = "clamp"
            seed = 42
            spawn_points = [{ x = 1.0, z = 2.0 }, { x = -1.0, z = -2.0 }]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:4000");
        assert_eq!(config.server.idle_timeout_ms, 15_000);
        assert_eq!(config.arena.max_clients, 4);
        assert_eq!(config.arena.color_policy, ColorPolicy::RandomNonunique);
        assert_eq!(config.arena.spawn_overflow, SpawnOverflow::Clamp);
        assert_eq!(config.arena.seed, Some(42));
        assert_eq!(config.arena.spawn_points[1], Point::new(-1.0, -2.0));
        assert_eq!(config.arena.field_size, 40);
    }

    #[test]
    fn test_invalid_arena_rejected() {
        assert!(Config::parse("[arena]\ncolors_length = 0\n").is_err());
        assert!(Config::parse("[arena]\nfield_size = 1\n").is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(Config::parse("[server\nbind = ").is_err());
    }
}
