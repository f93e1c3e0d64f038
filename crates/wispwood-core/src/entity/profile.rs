//! Per-archetype enemy data.

use crate::animation::{Clip, BOSS_CLIPS, LESHY_CLIPS, TWIG_CLIPS};
use crate::body::{Hitbox, StanceHitbox};
use crate::entity::Archetype;

/// Fixed data that distinguishes one enemy archetype from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    /// Which archetype this is.
    pub archetype: Archetype,
    /// Damage dealt to the shared health pool per landed swing.
    pub damage: i32,
    /// Resting collision box.
    pub hitbox: Hitbox,
    /// Collision box used while attacking, if it differs.
    pub attack_hitbox: Option<StanceHitbox>,
    /// How far above the tracked player position the enemy steers, so that
    /// sprite centres line up. Half the sprite height.
    pub aim_lift: f32,
    /// Whether this enemy's death wins the game.
    pub wins_game: bool,
    /// Animation clips.
    pub clips: &'static [Clip],
}

impl EnemyProfile {
    /// The forest guardian.
    #[must_use]
    pub const fn boss() -> Self {
        Self {
            archetype: Archetype::Boss,
            damage: 15,
            hitbox: Hitbox::new(35.0, 38.0, 14.0, 27.0),
            attack_hitbox: Some(StanceHitbox::new(47.0, 38.0, 2.0, 14.0, 27.0)),
            aim_lift: 32.0,
            wins_game: true,
            clips: BOSS_CLIPS,
        }
    }

    /// The walking twig.
    #[must_use]
    pub const fn twig() -> Self {
        Self {
            archetype: Archetype::Twig,
            damage: 8,
            hitbox: Hitbox::new(20.0, 16.0, 6.0, 16.0),
            attack_hitbox: None,
            aim_lift: 16.0,
            wins_game: false,
            clips: TWIG_CLIPS,
        }
    }

    /// The leshy.
    #[must_use]
    pub const fn leshy() -> Self {
        Self {
            archetype: Archetype::Leshy,
            damage: 10,
            hitbox: Hitbox::new(20.0, 16.0, 6.0, 16.0),
            attack_hitbox: None,
            aim_lift: 16.0,
            wins_game: false,
            clips: LESHY_CLIPS,
        }
    }

    /// Looks up the profile of an enemy archetype.
    ///
    /// Returns `None` for the player and the wisp.
    #[must_use]
    pub const fn for_archetype(archetype: Archetype) -> Option<Self> {
        match archetype {
            Archetype::Boss => Some(Self::boss()),
            Archetype::Twig => Some(Self::twig()),
            Archetype::Leshy => Some(Self::leshy()),
            Archetype::Player | Archetype::Wisp => None,
        }
    }
}
