//! Resolvers: the combat and health phase of a tick.
//!
//! After every entity has stepped, resolvers look at the scene as a whole and
//! apply the interactions that no single entity owns:
//!
//! 1. [`ContactResolver`]: player swings against the enemies the physics
//!    layer reports as touching.
//! 2. [`VitalsResolver`]: compares the shared health pool with the value the
//!    player last saw and forces hurt or death.
//!
//! Resolvers write what happened to the [`CombatLog`].
//!
//! # Invariants
//!
//! - Resolvers run in a fixed order, once per unpaused tick.
//! - Contacts are processed in id order regardless of the order reported.
//! - A transition request rejected by a terminal death state is dropped, not
//!   surfaced as an error.

mod combat;
mod event;
mod vitals;

pub use combat::ContactResolver;
pub use event::{CombatEvent, CombatLog, Record};
pub use vitals::VitalsResolver;

use crate::arena::Arena;
use crate::config::Tuning;
use crate::entity::EntityId;
use crate::error::SimError;
use crate::events::EventBus;
use crate::run_state::RunState;

/// Everything a resolver may read or mutate.
pub struct World<'a> {
    /// Entity storage.
    pub arena: &'a mut Arena,
    /// Shared run state.
    pub run: &'a mut RunState,
    /// Signal bus.
    pub events: &'a mut EventBus,
    /// Gameplay constants.
    pub tuning: &'a Tuning,
    /// Event record.
    pub log: &'a mut CombatLog,
    /// Enemies whose hitbox touches the player's this tick.
    pub contacts: &'a [EntityId],
    /// Current tick number.
    pub tick: u64,
}

impl World<'_> {
    /// Appends an event stamped with the current tick.
    pub fn record(&mut self, event: CombatEvent) {
        self.log.record(self.tick, event);
    }
}

/// One phase of end-of-tick resolution.
///
/// # Example
///
/// ```
/// use wispwood_core::error::SimError;
/// use wispwood_core::resolver::{Resolver, World};
///
/// /// Heals the player a little every tick.
/// struct Regen;
///
/// impl Resolver for Regen {
///     fn name(&self) -> &'static str {
///         "regen"
///     }
///
///     fn resolve(&mut self, world: &mut World<'_>) -> Result<(), SimError> {
///         world.run.heal(1);
///         Ok(())
///     }
/// }
/// ```
pub trait Resolver {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Applies this phase to the scene.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] when a forced transition hits a wiring bug.
    fn resolve(&mut self, world: &mut World<'_>) -> Result<(), SimError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_is_object_safe() {
        fn _accepts_boxed(_resolver: Box<dyn Resolver>) {}
        fn _accepts_slice(_resolvers: &[Box<dyn Resolver>]) {}
    }

    #[test]
    fn record_stamps_the_tick() {
        let mut arena = Arena::new();
        let mut run = RunState::default();
        let mut events = EventBus::new();
        let tuning = Tuning::default();
        let mut log = CombatLog::new();
        let mut world = World {
            arena: &mut arena,
            run: &mut run,
            events: &mut events,
            tuning: &tuning,
            log: &mut log,
            contacts: &[],
            tick: 12,
        };
        world.record(CombatEvent::PlayerKilled);

        let records = log.take_events();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tick, 12);
        assert_eq!(records[0].event, CombatEvent::PlayerKilled);
    }
}
