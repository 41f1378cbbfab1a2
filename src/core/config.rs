//! Kernel configuration with documented defaults
//!
//! Every subsystem owns its own parameter struct; `KernelConfig` collects
//! them so a whole battle can be configured from one TOML document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::CombatConfig;
use crate::core::error::{Result, TacticsError};
use crate::pathfinding::{MovementConfig, PathfinderConfig};
use crate::status::StatusTuning;
use crate::targeting::TargetingConfig;
use crate::visibility::LosConfig;

/// Configuration for every kernel subsystem
///
/// Missing sections in a TOML document fall back to their defaults, so a
/// file containing only `[combat]` is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// A* search options
    pub pathfinding: PathfinderConfig,

    /// Path following and replanning
    pub movement: MovementConfig,

    /// Line-of-sight broad phase and destination handling
    pub line_of_sight: LosConfig,

    /// Hit, damage and friendly-fire rules
    pub combat: CombatConfig,

    /// Status effect tick cadence and per-effect tuning
    pub status: StatusTuning,

    /// Target selection cadence and seek range
    pub targeting: TargetingConfig,
}

impl KernelConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: KernelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let weight = self.pathfinding.tie_break_weight;
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid(format!(
                "pathfinding.tie_break_weight ({weight}) must be a non-negative number"
            )));
        }

        let repath = self.movement.repath_interval;
        if !repath.is_finite() || repath < 0.0 {
            return Err(invalid(format!(
                "movement.repath_interval ({repath}) must be a non-negative number"
            )));
        }

        if let Some(range) = self.line_of_sight.max_range {
            if range < 0.0 {
                return Err(invalid(format!(
                    "line_of_sight.max_range ({range}) must be >= 0; omit it for unlimited range"
                )));
            }
        }

        if let Some(cos) = self.line_of_sight.fov_cos {
            if !(-1.0..=1.0).contains(&cos) {
                return Err(invalid(format!(
                    "line_of_sight.fov_cos ({cos}) must lie in [-1, 1]; omit it to disable the cone"
                )));
            }
        }

        if let Some(falloff) = &self.combat.falloff {
            if falloff.start_cells < 0.0 {
                return Err(invalid(format!(
                    "combat.falloff.start_cells ({}) must be >= 0",
                    falloff.start_cells
                )));
            }
            if !(0.0..=1.0).contains(&falloff.far_accuracy) {
                return Err(invalid(format!(
                    "combat.falloff.far_accuracy ({}) must lie in [0, 1]",
                    falloff.far_accuracy
                )));
            }
        }

        if self.status.tick_interval <= 0.0 {
            return Err(invalid(format!(
                "status.tick_interval ({}) must be positive",
                self.status.tick_interval
            )));
        }

        if self.targeting.tick_interval <= 0.0 {
            return Err(invalid(format!(
                "targeting.tick_interval ({}) must be positive",
                self.targeting.tick_interval
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> TacticsError {
    TacticsError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::Heuristic;

    #[test]
    fn test_default_config_is_valid() {
        let config = KernelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pathfinding.heuristic, Heuristic::Octile);
        assert!(config.pathfinding.allow_diagonal);
        assert!(config.line_of_sight.include_destination);
        assert!(!config.combat.allow_friendly_fire);
        assert!((config.movement.repath_interval - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            [combat]
            allow_friendly_fire = true

            [pathfinding]
            heuristic = "Manhattan"
            allow_diagonal = false
        "#;

        let config = KernelConfig::from_toml_str(text).unwrap();
        assert!(config.combat.allow_friendly_fire);
        assert!(config.combat.require_line_of_sight);
        assert_eq!(config.pathfinding.heuristic, Heuristic::Manhattan);
        assert!(!config.pathfinding.allow_diagonal);
        assert!((config.status.tick_interval - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_fov() {
        let mut config = KernelConfig::default();
        config.line_of_sight.fov_cos = Some(1.5);
        assert!(matches!(
            config.validate(),
            Err(TacticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_negative_repath_interval() {
        let mut config = KernelConfig::default();
        config.movement.repath_interval = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        let mut config = KernelConfig::default();
        config.status.tick_interval = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let result = KernelConfig::from_toml_str("[combat\nallow_friendly_fire = ");
        assert!(matches!(result, Err(TacticsError::TomlError(_))));
    }
}
