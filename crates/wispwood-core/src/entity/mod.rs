//! Entities of the play scene.
//!
//! This module provides:
//! - [`EntityId`]: unique identifier for entities
//! - [`Archetype`]: what kind of entity it is
//! - [`EntityInner`]: the per-kind component bundle ([`Player`], [`Wisp`],
//!   [`Enemy`]), each owning its body, animator, controller and state machine
//! - [`Entity`]: the container stored in the [`Arena`](crate::arena::Arena)
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use wispwood_core::config::Tuning;
//! use wispwood_core::entity::{Archetype, Entity, EntityId, EntityInner, Enemy, EnemyProfile};
//!
//! let tuning = Tuning::default();
//! let twig = Enemy::new(EnemyProfile::twig(), Vec2::new(10.0, 20.0), &tuning).unwrap();
//! let entity = Entity::new(EntityId::new(3), EntityInner::Enemy(twig));
//!
//! assert_eq!(entity.archetype(), Archetype::Twig);
//! assert_eq!(entity.body().position, Vec2::new(10.0, 20.0));
//! ```

pub mod enemy;
pub mod player;
pub mod profile;
pub mod wisp;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use wispwood_fsm::FsmError;

use crate::body::Body;

pub use enemy::{Enemy, EnemyKey, EnemyState};
pub use player::{Player, PlayerKey, PlayerState};
pub use profile::EnemyProfile;
pub use wisp::{Wisp, WispState};

/// Unique identifier for an entity.
///
/// Ids are handed out in increasing order by the arena and never reused, so
/// ordering by id is spawn order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Kind of entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// The player character.
    Player,
    /// The light companion that trails the player.
    Wisp,
    /// The forest guardian; killing it wins the game.
    Boss,
    /// Small walking twig.
    Twig,
    /// Forest spirit.
    Leshy,
}

impl Archetype {
    /// Returns `true` for archetypes driven by [`Enemy`].
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, Self::Boss | Self::Twig | Self::Leshy)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Wisp => "wisp",
            Self::Boss => "boss",
            Self::Twig => "twig",
            Self::Leshy => "leshy",
        };
        f.write_str(name)
    }
}

/// Per-kind component bundle.
#[derive(Debug)]
pub enum EntityInner {
    /// The player.
    Player(Player),
    /// The wisp companion.
    Wisp(Wisp),
    /// An enemy of any archetype.
    Enemy(Enemy),
}

/// An entity stored in the arena.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    inner: EntityInner,
}

impl Entity {
    /// Wraps a component bundle under `id`.
    #[must_use]
    pub const fn new(id: EntityId, inner: EntityInner) -> Self {
        Self { id, inner }
    }

    /// Returns the id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the archetype.
    #[must_use]
    pub fn archetype(&self) -> Archetype {
        match &self.inner {
            EntityInner::Player(_) => Archetype::Player,
            EntityInner::Wisp(_) => Archetype::Wisp,
            EntityInner::Enemy(enemy) => enemy.profile().archetype,
        }
    }

    /// Returns the component bundle.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns the component bundle mutably.
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        match &self.inner {
            EntityInner::Player(player) => player.body(),
            EntityInner::Wisp(wisp) => wisp.body(),
            EntityInner::Enemy(enemy) => enemy.body(),
        }
    }

    /// Returns the body mutably, for the physics layer to write positions.
    pub fn body_mut(&mut self) -> &mut Body {
        match &mut self.inner {
            EntityInner::Player(player) => player.body_mut(),
            EntityInner::Wisp(wisp) => wisp.body_mut(),
            EntityInner::Enemy(enemy) => enemy.body_mut(),
        }
    }

    /// Returns the player bundle, if this is the player.
    #[must_use]
    pub fn as_player(&self) -> Option<&Player> {
        match &self.inner {
            EntityInner::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Returns the player bundle mutably.
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.inner {
            EntityInner::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Returns the wisp bundle, if this is the wisp.
    #[must_use]
    pub fn as_wisp(&self) -> Option<&Wisp> {
        match &self.inner {
            EntityInner::Wisp(wisp) => Some(wisp),
            _ => None,
        }
    }

    /// Returns the wisp bundle mutably.
    pub fn as_wisp_mut(&mut self) -> Option<&mut Wisp> {
        match &mut self.inner {
            EntityInner::Wisp(wisp) => Some(wisp),
            _ => None,
        }
    }

    /// Returns the enemy bundle, if this is an enemy.
    #[must_use]
    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.inner {
            EntityInner::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Returns the enemy bundle mutably.
    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.inner {
            EntityInner::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Returns `true` for enemies.
    #[must_use]
    pub fn is_enemy(&self) -> bool {
        matches!(self.inner, EntityInner::Enemy(_))
    }
}

/// Drops transition requests that arrived too late.
///
/// A forced hurt or death on an entity that is already in its terminal death
/// state is a normal race, not a bug. Wiring errors still propagate.
pub(crate) fn tolerate<T: fmt::Display>(who: T, result: Result<(), FsmError>) -> Result<(), FsmError> {
    match result {
        Err(err) if !err.is_fatal() => {
            debug!(entity = %who, error = %err, "transition request dropped");
            Ok(())
        }
        other => other,
    }
}
