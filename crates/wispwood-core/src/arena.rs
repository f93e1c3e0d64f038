//! Entity storage for the play scene.
//!
//! The arena owns every entity and hands out ids in spawn order. Storage is a
//! `BTreeMap`, so iterating visits entities in id order and every run of the
//! same inputs updates enemies in the same sequence.
//!
//! The player and the wisp are singletons; the arena remembers their ids so
//! that resolvers can reach them without scanning.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use wispwood_core::arena::Arena;
//! use wispwood_core::config::Tuning;
//! use wispwood_core::entity::{Enemy, EnemyProfile, EntityInner};
//!
//! let tuning = Tuning::default();
//! let mut arena = Arena::new();
//! let a = arena.spawn(EntityInner::Enemy(Enemy::new(EnemyProfile::twig(), Vec2::ZERO, &tuning).unwrap()));
//! let b = arena.spawn(EntityInner::Enemy(Enemy::new(EnemyProfile::leshy(), Vec2::ONE, &tuning).unwrap()));
//!
//! assert_eq!(arena.enemy_ids(), vec![a, b]);
//! assert!(arena.player().is_none());
//! ```

use std::collections::BTreeMap;

use crate::entity::{Enemy, Entity, EntityId, EntityInner, Player, Wisp};
use crate::error::SimError;

/// Container of all entities in the scene.
#[derive(Debug, Default)]
pub struct Arena {
    next_id: u64,
    entities: BTreeMap<EntityId, Entity>,
    player: Option<EntityId>,
    wisp: Option<EntityId>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entity and returns its new id.
    ///
    /// Spawning a second player or wisp replaces the remembered singleton id;
    /// the earlier one stays in storage as an ordinary entity.
    pub fn spawn(&mut self, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        match inner {
            EntityInner::Player(_) => self.player = Some(id),
            EntityInner::Wisp(_) => self.wisp = Some(id),
            EntityInner::Enemy(_) => {}
        }
        self.entities.insert(id, Entity::new(id, inner));
        id
    }

    /// Removes an entity and returns it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        if self.player == Some(id) {
            self.player = None;
        }
        if self.wisp == Some(id) {
            self.wisp = None;
        }
        self.entities.remove(&id)
    }

    /// Returns an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns an entity by id, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns an entity by id or [`SimError::UnknownEntity`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownEntity`] if no entity has this id.
    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut Entity, SimError> {
        self.entities.get_mut(&id).ok_or(SimError::UnknownEntity(id))
    }

    /// Returns the player's id.
    #[must_use]
    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    /// Returns the wisp's id.
    #[must_use]
    pub fn wisp_id(&self) -> Option<EntityId> {
        self.wisp
    }

    /// Returns the player.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player
            .and_then(|id| self.entities.get(&id))
            .and_then(Entity::as_player)
    }

    /// Returns the player mutably.
    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player
            .and_then(|id| self.entities.get_mut(&id))
            .and_then(Entity::as_player_mut)
    }

    /// Returns the wisp.
    #[must_use]
    pub fn wisp(&self) -> Option<&Wisp> {
        self.wisp
            .and_then(|id| self.entities.get(&id))
            .and_then(Entity::as_wisp)
    }

    /// Returns the wisp mutably.
    pub fn wisp_mut(&mut self) -> Option<&mut Wisp> {
        self.wisp
            .and_then(|id| self.entities.get_mut(&id))
            .and_then(Entity::as_wisp_mut)
    }

    /// Returns an enemy by id.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.entities.get(&id).and_then(Entity::as_enemy)
    }

    /// Returns an enemy by id, mutably.
    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.entities.get_mut(&id).and_then(Entity::as_enemy_mut)
    }

    /// Returns the ids of all enemies in id order.
    #[must_use]
    pub fn enemy_ids(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_enemy())
            .map(Entity::id)
            .collect()
    }

    /// Iterates over entities in id order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Iterates mutably over entities in id order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the arena holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
