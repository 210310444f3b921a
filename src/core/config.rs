//! Simulation configuration with documented constants
//!
//! All tunable numbers used by the turn processor, the registry and the
//! diplomacy rules are collected here. The configuration is owned by the
//! `Game`; nothing reads it through a global.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the simulation systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === REGISTRY ===
    /// Explicit removals tolerated before a full sweep of decayed entries
    ///
    /// Keeps amortized removal cheap while bounding how many decayed
    /// entries can pile up between sweeps.
    pub sweep_threshold: u32,

    // === DIPLOMACY ===
    /// Margin applied around tension thresholds before the stance changes
    ///
    /// A war only cools to cease-fire once tension sits this far below
    /// the "content" level, and peace only breaks into war this far above
    /// the "hateful" level. Not scaled by difficulty.
    pub tension_hysteresis: i32,

    // === COLONY TURN ===
    /// Famine warning horizon in turns
    ///
    /// A colony whose food stock will run out within this many turns
    /// at the current rate of loss warns its owner.
    pub famine_turns: u32,

    /// Standard cargo size; warehouse watermarks scale by capacity / cargo size
    pub cargo_size: u32,

    /// Liberty points needed to make one colonist a rebel
    pub liberty_per_rebel: u32,

    /// Sons of Liberty percentage granting +1 production
    pub good_government_limit: u32,

    /// Sons of Liberty percentage granting +2 production
    pub very_good_government_limit: u32,

    /// Tory count above which production drops by 1
    pub bad_government_limit: u32,

    /// Tory count above which production drops by 2
    pub very_bad_government_limit: u32,

    /// Denominator of the per-turn chance that experience converts a
    /// colonist into an expert (chance = experience / odds)
    pub experience_upgrade_odds: u32,

    /// Experience stops accumulating at this value
    pub max_experience: u32,

    // === VISIBILITY ===
    /// Base line of sight of a colony before building bonuses
    pub colony_line_of_sight: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sweep_threshold: 64,
            tension_hysteresis: 10,
            famine_turns: 3,
            cargo_size: 100,
            liberty_per_rebel: 200,
            good_government_limit: 50,
            very_good_government_limit: 100,
            bad_government_limit: 6,
            very_bad_government_limit: 10,
            experience_upgrade_odds: 5000,
            max_experience: 200,
            colony_line_of_sight: 1,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cargo_size == 0 {
            return Err(ConfigError::Invalid("cargo_size must be positive".into()));
        }
        if self.liberty_per_rebel == 0 {
            return Err(ConfigError::Invalid("liberty_per_rebel must be positive".into()));
        }
        if self.good_government_limit >= self.very_good_government_limit {
            return Err(ConfigError::Invalid(format!(
                "good_government_limit ({}) should be < very_good_government_limit ({})",
                self.good_government_limit, self.very_good_government_limit
            )));
        }
        if self.bad_government_limit >= self.very_bad_government_limit {
            return Err(ConfigError::Invalid(format!(
                "bad_government_limit ({}) should be < very_bad_government_limit ({})",
                self.bad_government_limit, self.very_bad_government_limit
            )));
        }
        if self.tension_hysteresis < 0 {
            return Err(ConfigError::Invalid("tension_hysteresis must not be negative".into()));
        }
        if self.experience_upgrade_odds == 0 {
            return Err(ConfigError::Invalid("experience_upgrade_odds must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sweep_threshold, 64);
        assert_eq!(config.tension_hysteresis, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str("famine_turns = 5\n").expect("parse");
        assert_eq!(config.famine_turns, 5);
        assert_eq!(config.cargo_size, 100);
    }

    #[test]
    fn test_inverted_government_limits_rejected() {
        let result = SimulationConfig::from_toml_str(
            "good_government_limit = 100\nvery_good_government_limit = 50\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_garbage_toml_rejected() {
        let result = SimulationConfig::from_toml_str("famine_turns = \"many\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
