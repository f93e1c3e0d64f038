//! Gameplay tuning.
//!
//! [`Tuning`] collects every constant the simulation reads. The defaults
//! reproduce the shipped game; a host can override any subset from JSON:
//!
//! ```
//! use wispwood_core::config::Tuning;
//!
//! let tuning = Tuning::from_json(r#"{ "player_speed": 320.0, "spawn_delay": 0.0 }"#).unwrap();
//! assert!((tuning.player_speed - 320.0).abs() < f32::EPSILON);
//! assert_eq!(tuning.max_health, 100);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration or scene plans.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input was not valid JSON for the target type.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A field parsed but holds an unusable value.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Gameplay constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Ceiling of the shared health pool.
    pub max_health: i32,
    /// Ceiling of the special resource.
    pub max_special: u8,
    /// Special resource a fresh session starts with.
    pub initial_special: u8,
    /// Player speed per axis, units per second.
    pub player_speed: f32,
    /// Each axis of a diagonal gets `player_speed / diagonal_divisor`.
    pub diagonal_divisor: f32,
    /// Roll speed as a multiple of `player_speed`.
    pub roll_speed_factor: f32,
    /// Horizontal lead of the tracked player position in the facing direction.
    pub stop_distance: f32,
    /// Damage of attack1, attack2 and attack3.
    pub combo_damage: [i32; 3],
    /// Clip progress after which an attack arms its damage.
    pub damage_window: f32,
    /// Seconds the player stays hidden before spawning in.
    pub spawn_delay: f32,
    /// Enemy chase speed.
    pub enemy_speed: f32,
    /// Per-axis distance below which an enemy starts following.
    pub follow_distance: f32,
    /// Per-axis distance beyond which an enemy stops chasing.
    pub engagement_cap: f32,
    /// Seconds an enemy waits in range before attacking.
    pub attack_delay: f32,
    /// Per-axis half extents of the enemy melee box.
    pub melee_offset: Vec2,
    /// Health restored when an enemy dies.
    pub kill_heal: i32,
    /// Special resource granted when an enemy dies.
    pub kill_special: u8,
    /// Wisp position relative to the player.
    pub wisp_offset: Vec2,
    /// Seconds between `Cast` and `CastEnd`.
    pub cast_glow: f32,
    /// Clip frame rate in frames per second.
    pub frame_rate: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            max_special: 3,
            initial_special: 3,
            player_speed: 400.0,
            diagonal_divisor: 1.44,
            roll_speed_factor: 1.5,
            stop_distance: 40.0,
            combo_damage: [10, 15, 20],
            damage_window: 0.5,
            spawn_delay: 7.0,
            enemy_speed: 100.0,
            follow_distance: 100.0,
            engagement_cap: 700.0,
            attack_delay: 1.0,
            melee_offset: Vec2::new(50.0, 50.0),
            kill_heal: 5,
            kill_special: 1,
            wisp_offset: Vec2::new(30.0, -30.0),
            cast_glow: 3.5,
            frame_rate: 10.0,
        }
    }
}

impl Tuning {
    /// Parses and validates tuning from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Json`] if the input does not parse.
    /// - [`ConfigError::Invalid`] if a value fails [`Tuning::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("player_speed", self.player_speed)?;
        non_negative("roll_speed_factor", self.roll_speed_factor)?;
        non_negative("stop_distance", self.stop_distance)?;
        non_negative("damage_window", self.damage_window)?;
        non_negative("spawn_delay", self.spawn_delay)?;
        non_negative("enemy_speed", self.enemy_speed)?;
        non_negative("follow_distance", self.follow_distance)?;
        non_negative("engagement_cap", self.engagement_cap)?;
        non_negative("attack_delay", self.attack_delay)?;
        non_negative("melee_offset.x", self.melee_offset.x)?;
        non_negative("melee_offset.y", self.melee_offset.y)?;
        non_negative("cast_glow", self.cast_glow)?;
        if !self.wisp_offset.is_finite() {
            return Err(invalid("wisp_offset", "must be finite"));
        }

        positive("diagonal_divisor", self.diagonal_divisor)?;
        positive("frame_rate", self.frame_rate)?;
        if self.max_health <= 0 {
            return Err(invalid("max_health", "must be positive"));
        }
        if self.max_special == 0 {
            return Err(invalid("max_special", "must be positive"));
        }
        if self.initial_special > self.max_special {
            return Err(invalid("initial_special", "must not exceed max_special"));
        }
        if self.damage_window > 1.0 {
            return Err(invalid("damage_window", "must not exceed 1.0"));
        }
        if self.combo_damage.iter().any(|&d| d < 0) {
            return Err(invalid("combo_damage", "must not be negative"));
        }
        if self.kill_heal < 0 {
            return Err(invalid("kill_heal", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite, non-negative number, got {value}"),
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite, positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(Tuning::from_json("{}").unwrap(), Tuning::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let tuning = Tuning::from_json(r#"{ "combo_damage": [1, 2, 3], "melee_offset": [10.0, 20.0] }"#).unwrap();
        assert_eq!(tuning.combo_damage, [1, 2, 3]);
        assert_eq!(tuning.melee_offset, Vec2::new(10.0, 20.0));
        assert_eq!(tuning.kill_heal, 5);
    }

    #[test]
    fn negative_speed_is_rejected() {
        let err = Tuning::from_json(r#"{ "enemy_speed": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "enemy_speed", .. }));
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let err = Tuning::from_json(r#"{ "diagonal_divisor": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "diagonal_divisor", .. }));
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        let tuning = Tuning {
            frame_rate: 0.0,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "frame_rate", .. })
        ));
    }

    #[test]
    fn initial_special_is_capped_by_the_ceiling() {
        assert_eq!(Tuning::default().initial_special, 3);
        let err = Tuning::from_json(r#"{ "max_special": 2, "initial_special": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "initial_special", .. }));
        assert!(Tuning::from_json(r#"{ "initial_special": 0 }"#).is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Tuning::from_json("{ player_speed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("failed to parse configuration"));
    }

    #[test]
    fn serialization_roundtrip() {
        let tuning = Tuning {
            spawn_delay: 0.0,
            ..Tuning::default()
        };
        let json = serde_json::to_string(&tuning).unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
