//! Health-delta detection.
//!
//! Enemy swings lower the shared pool directly from their attack state. The
//! player notices on the next resolution pass by comparing the pool with the
//! value it saw last:
//!
//! - pool at zero: `DEAD`, player to death, wisp to death;
//! - pool lower: player to hurt, wisp to flicker;
//! - pool higher (a kill reward): remembered, nothing else.
//!
//! A rising pool never plays the hurt reaction. Only a drop flinches, so the
//! +5 heal from a kill leaves the player in whatever state it was in.

use tracing::{debug, info};

use crate::entity::{PlayerKey, WispState};
use crate::error::SimError;

use super::{CombatEvent, Resolver, World};

/// Turns changes of the shared health pool into player reactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalsResolver;

impl VitalsResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolver for VitalsResolver {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn resolve(&mut self, world: &mut World<'_>) -> Result<(), SimError> {
        if world.run.game_over() {
            world.run.pin_health_to_zero();
        }
        let pool = world.run.health();

        let Some(player) = world.arena.player_mut() else {
            return Ok(());
        };
        let seen = player.observe_health(pool);
        if pool >= seen || player.is_dead() {
            return Ok(());
        }

        let (player_to, wisp_to, event) = if pool <= 0 {
            player.kill();
            info!(from = seen, "player killed");
            (PlayerKey::Death, WispState::Death, CombatEvent::PlayerKilled)
        } else {
            player.flinch();
            debug!(from = seen, to = pool, "player hurt");
            (
                PlayerKey::Hurt,
                WispState::Flicker,
                CombatEvent::PlayerHurt { health: pool },
            )
        };

        player.force(player_to, world.run, world.events, world.tuning)?;
        if let Some(wisp) = world.arena.wisp_mut() {
            wisp.force(wisp_to)?;
        }
        world.record(event);
        Ok(())
    }
}
