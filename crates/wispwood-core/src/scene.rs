//! Spawn plans for the play scene.
//!
//! A [`ScenePlan`] lists where the player starts and which enemies populate
//! the level. Hosts usually export it from their tilemap's object layer as
//! JSON:
//!
//! ```
//! use wispwood_core::entity::Archetype;
//! use wispwood_core::scene::ScenePlan;
//!
//! let plan = ScenePlan::from_json(r#"{
//!     "enemies": [
//!         { "archetype": "twig", "position": [400.0, 2800.0] },
//!         { "archetype": "boss", "position": [1600.0, 600.0] }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(plan.enemies.len(), 2);
//! assert_eq!(plan.enemies[1].archetype, Archetype::Boss);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::entity::Archetype;

/// Where the player enters the level when no plan says otherwise.
pub const DEFAULT_PLAYER_SPAWN: Vec2 = Vec2::new(163.0, 2840.0);

/// One enemy to place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Which enemy.
    pub archetype: Archetype,
    /// Where.
    pub position: Vec2,
}

impl SpawnPoint {
    /// Creates a spawn point.
    #[must_use]
    pub const fn new(archetype: Archetype, position: Vec2) -> Self {
        Self {
            archetype,
            position,
        }
    }
}

/// Player start plus enemy placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenePlan {
    /// Player start position.
    pub player: Vec2,
    /// Enemies, spawned in list order.
    pub enemies: Vec<SpawnPoint>,
}

impl Default for ScenePlan {
    fn default() -> Self {
        Self {
            player: DEFAULT_PLAYER_SPAWN,
            enemies: Vec::new(),
        }
    }
}

impl ScenePlan {
    /// Parses and validates a plan from JSON.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Json`] if the input does not parse.
    /// - [`ConfigError::Invalid`] if a value fails [`ScenePlan::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let plan: Self = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Checks that every spawn is an enemy at a finite position.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first bad entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.player.is_finite() {
            return Err(ConfigError::Invalid {
                field: "player",
                reason: "must be finite".to_owned(),
            });
        }
        for (index, spawn) in self.enemies.iter().enumerate() {
            if !spawn.archetype.is_enemy() {
                return Err(ConfigError::Invalid {
                    field: "enemies",
                    reason: format!("entry {index}: {} is not an enemy", spawn.archetype),
                });
            }
            if !spawn.position.is_finite() {
                return Err(ConfigError::Invalid {
                    field: "enemies",
                    reason: format!("entry {index}: position must be finite"),
                });
            }
        }
        Ok(())
    }

    /// Adds an enemy to the plan.
    #[must_use]
    pub fn with_enemy(mut self, archetype: Archetype, position: Vec2) -> Self {
        self.enemies.push(SpawnPoint::new(archetype, position));
        self
    }
}
