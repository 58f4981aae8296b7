//! Layered simulation configuration loaded from TOML.

use maze_chase_system_adaptation::AdaptationConfig;
use maze_chase_system_pursuit::PursuitConfig;
use maze_chase_world::{generation::MIN_GRID_SIZE, WorldConfig};
use serde::Deserialize;
use thiserror::Error;

/// Complete configuration of a simulation run.
///
/// Every table and key is optional; omitted values fall back to the defaults
/// of the respective component.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master seed from which every random generator is derived.
    pub seed: u64,
    /// Ticks per simulated second; adapters use it to pace the loop.
    pub tick_rate_hz: u32,
    /// Authoritative world tuning.
    pub world: WorldConfig,
    /// Enemy decision tuning.
    pub pursuit: PursuitConfig,
    /// Maze mutation tuning.
    pub adaptation: AdaptationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            tick_rate_hz: 60,
            world: WorldConfig::default(),
            pursuit: PursuitConfig::default(),
            adaptation: AdaptationConfig::default(),
        }
    }
}

/// Failures raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("failed to parse simulation config")]
    Parse(#[from] toml::de::Error),
    /// The tick rate must be positive.
    #[error("tick rate must be positive")]
    ZeroTickRate,
    /// The grid cannot hold a border plus distinct start and exit tiles.
    #[error("grid size {size} is below the minimum of {}", MIN_GRID_SIZE)]
    GridTooSmall {
        /// Configured edge length.
        size: u32,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("{field} must lie within [0, 1], got {value}")]
    Probability {
        /// Name of the offending key.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// A value that has to be positive is not.
    #[error("{field} must be positive")]
    NotPositive {
        /// Name of the offending key.
        field: &'static str,
    },
    /// The adaptation ring around the player is empty.
    #[error("adaptation radius {min}..={max} is empty")]
    EmptyRadius {
        /// Configured inner radius.
        min: u32,
        /// Configured outer radius.
        max: u32,
    },
}

impl SimulationConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }

        let world = &self.world;
        if world.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall {
                size: world.grid_size,
            });
        }
        for (field, value) in [
            ("world.wall_probability", world.wall_probability),
            ("world.health_powerup_chance", world.health_powerup_chance),
            ("world.player_easing", world.player_easing),
            ("world.enemy_easing", world.enemy_easing),
            ("pursuit.base_intelligence", self.pursuit.base_intelligence),
            ("pursuit.max_intelligence", self.pursuit.max_intelligence),
            ("adaptation.rate", self.adaptation.rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }
        if world.max_health <= 0 {
            return Err(ConfigError::NotPositive {
                field: "world.max_health",
            });
        }
        if world.enemy_decision_ticks == 0 {
            return Err(ConfigError::NotPositive {
                field: "world.enemy_decision_ticks",
            });
        }
        if world.contact_radius <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "world.contact_radius",
            });
        }

        let adaptation = &self.adaptation;
        if adaptation.min_player_radius > adaptation.max_player_radius {
            return Err(ConfigError::EmptyRadius {
                min: adaptation.min_player_radius,
                max: adaptation.max_player_radius,
            });
        }

        Ok(())
    }
}
