//! Player swings against touching enemies.
//!
//! Damage flows from the player to an enemy only when
//! - the player has armed attack damage this tick,
//! - the physics layer reports the two as touching,
//! - the pair's contact latch is active, and
//! - they face opposite directions.
//!
//! A landed hit turns the pair's latch off until the player's next animation
//! completes, so one swing cannot hit the same enemy twice.

use std::collections::BTreeSet;

use tracing::{info, trace};

use crate::entity::enemy::HitOutcome;
use crate::entity::EntityId;

use super::{CombatEvent, Resolver, World};
use crate::error::SimError;

/// Applies armed player damage to touching enemies.
#[derive(Debug, Clone, Default)]
pub struct ContactResolver {
    latched: BTreeSet<EntityId>,
}

impl ContactResolver {
    /// Creates a resolver with every latch active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a hit on `enemy` can land.
    #[must_use]
    pub fn is_active(&self, enemy: EntityId) -> bool {
        !self.latched.contains(&enemy)
    }

    /// Re-activates every latch. Called when the player's animation completes.
    pub fn rearm(&mut self) {
        if !self.latched.is_empty() {
            trace!(count = self.latched.len(), "contact latches re-armed");
            self.latched.clear();
        }
    }

    /// Drops the latch of a removed enemy.
    pub fn forget(&mut self, enemy: EntityId) {
        self.latched.remove(&enemy);
    }
}

impl Resolver for ContactResolver {
    fn name(&self) -> &'static str {
        "contact"
    }

    fn resolve(&mut self, world: &mut World<'_>) -> Result<(), SimError> {
        let damage = world.run.take_pending_damage();
        if damage <= 0 {
            return Ok(());
        }
        let Some(attacker) = world.arena.player().map(|p| p.body().facing) else {
            return Ok(());
        };

        let mut contacts = world.contacts.to_vec();
        contacts.sort_unstable();
        contacts.dedup();

        for id in contacts {
            if !self.is_active(id) {
                trace!(enemy = %id, "contact latched; no damage");
                continue;
            }
            let Some(enemy) = world.arena.enemy_mut(id) else {
                trace!(enemy = %id, "contact with a non-enemy ignored");
                continue;
            };
            if enemy.is_dead() {
                continue;
            }
            if enemy.body().facing == attacker {
                trace!(enemy = %id, "same facing; no damage");
                continue;
            }

            self.latched.insert(id);
            let outcome = enemy.receive_hit(damage, world.run, world.tuning)?;
            let health = enemy.health();
            let archetype = enemy.profile().archetype;
            trace!(enemy = %id, damage, health, "player hit landed");

            world.record(CombatEvent::EnemyHit {
                enemy: id,
                damage,
                health,
            });
            if outcome == HitOutcome::Killed {
                info!(enemy = %id, %archetype, "enemy killed");
                world.record(CombatEvent::EnemyKilled {
                    enemy: id,
                    archetype,
                });
            }
        }
        Ok(())
    }
}
