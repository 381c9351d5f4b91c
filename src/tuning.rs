//! Data-driven game balance
//!
//! Every field defaults to the shipped balance, so a JSON override only needs
//! the values it wants to change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{FRAME_DT_CAP, WORLD_HEIGHT, WORLD_WIDTH};
use crate::error::SimError;

/// Balance values read by the simulation subsystems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    /// Ground scroll speed (pixels/sec, downward)
    pub scroll_speed: f32,
    /// Number of ground targets kept in the scrolling world
    pub ground_target_count: usize,

    // === Clock ===
    pub frame_dt_cap: f32,

    // === Enemy spawning ===
    /// Initial seconds between trickle spawns
    pub spawn_interval_start: f32,
    /// Trickle spawn interval never drops below this
    pub spawn_interval_floor: f32,
    /// Interval reduction applied after every trickle spawn
    pub spawn_interval_decay: f32,
    /// Seconds between scripted waves
    pub wave_period: f32,
    /// Chance that a killed non-boss enemy drops a powerup
    pub drop_chance: f32,

    // === Powerups ===
    pub powerup_spawn_interval: f32,
    pub powerup_lifetime: f32,
    pub timed_powerup_duration: f32,
    pub shield_duration: f32,

    // === Bombs ===
    /// Constant bomb travel speed used to solve the ballistic velocity
    pub bomb_fall_speed: f32,
    /// Distance to target under which a bomb detonates
    pub bomb_arrival_epsilon: f32,
    /// Splash radius per bomb power tier
    pub blast_radius_per_power: f32,

    // === Collision ===
    /// Live collider count above which the spatial grid replaces brute force
    pub brute_force_threshold: usize,
    pub grid_cell_size: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            scroll_speed: 40.0,
            ground_target_count: 12,

            frame_dt_cap: FRAME_DT_CAP,

            spawn_interval_start: 2.0,
            spawn_interval_floor: 0.5,
            spawn_interval_decay: 0.01,
            wave_period: 30.0,
            drop_chance: 0.15,

            powerup_spawn_interval: 15.0,
            powerup_lifetime: 10.0,
            timed_powerup_duration: 10.0,
            shield_duration: 8.0,

            bomb_fall_speed: 300.0,
            bomb_arrival_epsilon: 10.0,
            blast_radius_per_power: 25.0,

            brute_force_threshold: 50,
            grid_cell_size: 64.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(|source| SimError::Config {
            origin: "<inline>".to_string(),
            source,
        })?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning: Tuning = serde_json::from_str(&json).map_err(|source| SimError::Config {
            origin: path.display().to_string(),
            source,
        })?;
        tuning.validate()?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("frame_dt_cap", self.frame_dt_cap),
            ("spawn_interval_floor", self.spawn_interval_floor),
            ("wave_period", self.wave_period),
            ("powerup_spawn_interval", self.powerup_spawn_interval),
            ("powerup_lifetime", self.powerup_lifetime),
            ("timed_powerup_duration", self.timed_powerup_duration),
            ("shield_duration", self.shield_duration),
            ("bomb_fall_speed", self.bomb_fall_speed),
            ("bomb_arrival_epsilon", self.bomb_arrival_epsilon),
            ("blast_radius_per_power", self.blast_radius_per_power),
            ("grid_cell_size", self.grid_cell_size),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(SimError::InvalidTuning {
                    field,
                    value,
                    expected: "> 0",
                });
            }
        }

        if self.spawn_interval_start < self.spawn_interval_floor {
            return Err(SimError::InvalidTuning {
                field: "spawn_interval_start",
                value: self.spawn_interval_start,
                expected: ">= spawn_interval_floor",
            });
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(SimError::InvalidTuning {
                field: "drop_chance",
                value: self.drop_chance,
                expected: "0.0..=1.0",
            });
        }
        if self.spawn_interval_decay < 0.0 {
            return Err(SimError::InvalidTuning {
                field: "spawn_interval_decay",
                value: self.spawn_interval_decay,
                expected: ">= 0",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "wave_period": 12.5 }"#).unwrap();
        assert_eq!(tuning.wave_period, 12.5);
        assert_eq!(tuning.bomb_fall_speed, Tuning::default().bomb_fall_speed);
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let err = Tuning::from_json_str(r#"{ "wave_period": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTuning {
                field: "wave_period",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = Tuning::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Tuning::load("/definitely/not/here/tuning.json").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
