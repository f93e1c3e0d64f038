//! The play-scene loop.
//!
//! [`Simulation`] owns the arena, the run state and the signal bus, and runs
//! one tick per [`Simulation::step`] in a fixed order:
//!
//! 1. **SIGNALS**: advance the bus.
//! 2. **INPUT**: apply pointer and key edges from the [`Frame`].
//! 3. **PAUSE**: if paused, zero velocities, elapse countdowns and stop.
//!    Ready signals wait for the next unpaused tick.
//! 4. **PLAYER**: deliver ready signals, animate, decide intents, step and
//!    publish the player's position.
//! 5. **WISP**: follow the player, animate, step, react to signals.
//! 6. **ENEMIES**: in id order, animate, chase, step.
//! 7. **RESOLUTION**: contacts, then health-delta detection.
//! 8. **CLEANUP**: remove enemies whose death clip finished.
//!
//! # Determinism
//!
//! The loop is single-threaded. Enemies update in id order and contacts are
//! resolved in id order, so the same frames and the same `dt` always produce
//! the same scene.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use wispwood_core::config::Tuning;
//! use wispwood_core::entity::Archetype;
//! use wispwood_core::simulation::{Frame, Simulation};
//!
//! let mut sim = Simulation::new(Tuning::default()).unwrap();
//! sim.spawn_enemy(Archetype::Twig, Vec2::new(400.0, 2800.0)).unwrap();
//!
//! for _ in 0..10 {
//!     sim.step(&Frame::default(), 0.016).unwrap();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! ```

use std::fmt;

use glam::Vec2;
use tracing::{debug, info, trace};

use crate::arena::Arena;
use crate::config::Tuning;
use crate::entity::{Archetype, Enemy, EnemyProfile, EntityId, EntityInner, Player, Wisp};
use crate::error::SimError;
use crate::events::{EventBus, Signal};
use crate::input::{HeldKeys, InputEvent};
use crate::resolver::{CombatEvent, CombatLog, ContactResolver, Record, Resolver, VitalsResolver, World};
use crate::run_state::RunState;
use crate::scene::ScenePlan;

// =============================================================================
// Frame
// =============================================================================

/// Everything the host reports for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Directional keys held down.
    pub held: HeldKeys,
    /// Pointer and key edges since the last tick, in arrival order.
    pub inputs: Vec<InputEvent>,
    /// Enemies whose hitbox overlaps the player's.
    pub contacts: Vec<EntityId>,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the held keys.
    #[must_use]
    pub fn with_held(mut self, held: HeldKeys) -> Self {
        self.held = held;
        self
    }

    /// Appends an input edge.
    #[must_use]
    pub fn with_input(mut self, event: InputEvent) -> Self {
        self.inputs.push(event);
        self
    }

    /// Appends a contact.
    #[must_use]
    pub fn with_contact(mut self, enemy: EntityId) -> Self {
        self.contacts.push(enemy);
        self
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// The play scene: player, wisp and enemies plus the shared run state.
pub struct Simulation {
    arena: Arena,
    run: RunState,
    events: EventBus,
    tuning: Tuning,
    plan: ScenePlan,
    contacts: ContactResolver,
    vitals: VitalsResolver,
    log: CombatLog,
    tick: u64,
    shown: bool,
    announced_won: bool,
    announced_over: bool,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("run", &self.run)
            .field("entities", &self.arena.entity_count())
            .field("pending_signals", &self.events.pending())
            .field("log", &format!("[{} records]", self.log.len()))
            .field("shown", &self.shown)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a scene with the player at the default spawn and no enemies.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `tuning` fails validation.
    /// - [`SimError::Fsm`] if a state graph is miswired.
    pub fn new(tuning: Tuning) -> Result<Self, SimError> {
        Self::from_scene(tuning, ScenePlan::default())
    }

    /// Creates a scene from a spawn plan.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `tuning` or `plan` fails validation.
    /// - [`SimError::Fsm`] if a state graph is miswired.
    pub fn from_scene(tuning: Tuning, plan: ScenePlan) -> Result<Self, SimError> {
        tuning.validate()?;
        plan.validate()?;

        let mut sim = Self {
            arena: Arena::new(),
            run: RunState::new(&tuning),
            events: EventBus::new(),
            tuning,
            plan,
            contacts: ContactResolver::new(),
            vitals: VitalsResolver::new(),
            log: CombatLog::new(),
            tick: 0,
            shown: false,
            announced_won: false,
            announced_over: false,
        };
        sim.populate()?;
        Ok(sim)
    }

    fn populate(&mut self) -> Result<(), SimError> {
        let start = self.plan.player;
        self.arena
            .spawn(EntityInner::Player(Player::new(start, &self.tuning)?));
        self.arena
            .spawn(EntityInner::Wisp(Wisp::new(start, &self.tuning)?));

        let spawns = self.plan.enemies.clone();
        for spawn in spawns {
            self.spawn_enemy(spawn.archetype, spawn.position)?;
        }
        debug!(entities = self.arena.entity_count(), "scene populated");
        Ok(())
    }

    /// Adds an enemy at `position`.
    ///
    /// # Errors
    ///
    /// - [`SimError::NotAnEnemy`] for the player or wisp archetypes.
    /// - [`SimError::Fsm`] if the state graph is miswired.
    pub fn spawn_enemy(&mut self, archetype: Archetype, position: Vec2) -> Result<EntityId, SimError> {
        let profile = EnemyProfile::for_archetype(archetype).ok_or(SimError::NotAnEnemy(archetype))?;
        let enemy = Enemy::new(profile, position, &self.tuning)?;
        let id = self.arena.spawn(EntityInner::Enemy(enemy));
        trace!(enemy = %id, %archetype, "enemy spawned");
        Ok(id)
    }

    /// Runs one tick of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if a state graph hits a wiring bug. Rejected
    /// transitions out of terminal death states are not errors.
    pub fn step(&mut self, frame: &Frame, dt: f32) -> Result<(), SimError> {
        self.tick += 1;

        // SIGNALS
        self.events.advance(dt);

        // INPUT
        let special = self.run.special();
        if let Some(player) = self.arena.player_mut() {
            for &event in &frame.inputs {
                player.apply_input(event, special);
            }
        }

        // PAUSE
        if self.run.paused() {
            self.suspend(dt);
            return Ok(());
        }

        let signals = self.events.drain();
        for signal in &signals {
            match signal {
                Signal::StartPlay => self.shown = true,
                Signal::Cast => self.events.emit_after(Signal::CastEnd, self.tuning.cast_glow),
                Signal::CastEnd => {}
            }
        }

        // PLAYER
        if let Some(player) = self.arena.player_mut() {
            let completed = player.tick(frame.held, &mut self.run, &mut self.events, &self.tuning, dt)?;
            if completed {
                self.contacts.rearm();
            }
        }

        // WISP
        let leader = self.arena.player().map(|p| p.body().clone());
        if let (Some(leader), Some(wisp)) = (leader, self.arena.wisp_mut()) {
            wisp.tick(&leader, &signals, dt)?;
        }

        // ENEMIES
        for id in self.arena.enemy_ids() {
            if let Some(enemy) = self.arena.enemy_mut(id) {
                enemy.tick(&mut self.run, &self.tuning, dt)?;
            }
        }

        // RESOLUTION
        let mut world = World {
            arena: &mut self.arena,
            run: &mut self.run,
            events: &mut self.events,
            tuning: &self.tuning,
            log: &mut self.log,
            contacts: &frame.contacts,
            tick: self.tick,
        };
        let resolvers: [&mut dyn Resolver; 2] = [&mut self.contacts, &mut self.vitals];
        for resolver in resolvers {
            trace!(resolver = resolver.name(), tick = world.tick, "resolving");
            resolver.resolve(&mut world)?;
        }

        // CLEANUP
        self.remove_expired();
        self.announce_outcome();
        Ok(())
    }

    fn suspend(&mut self, dt: f32) {
        for entity in self.arena.entities_sorted_mut() {
            match entity.inner_mut() {
                EntityInner::Player(player) => player.suspend(dt),
                EntityInner::Wisp(wisp) => wisp.suspend(dt),
                EntityInner::Enemy(enemy) => enemy.suspend(dt),
            }
        }
    }

    fn remove_expired(&mut self) {
        let expired: Vec<EntityId> = self
            .arena
            .enemy_ids()
            .into_iter()
            .filter(|&id| self.arena.enemy(id).is_some_and(Enemy::is_expired))
            .collect();

        for id in expired {
            if let Some(entity) = self.arena.despawn(id) {
                let archetype = entity.archetype();
                self.contacts.forget(id);
                info!(enemy = %id, %archetype, "enemy removed");
                self.log.record(
                    self.tick,
                    CombatEvent::EnemyRemoved {
                        enemy: id,
                        archetype,
                    },
                );
            }
        }
    }

    fn announce_outcome(&mut self) {
        if self.run.game_won() && !self.announced_won {
            self.announced_won = true;
            info!(tick = self.tick, "game won");
            self.log.record(self.tick, CombatEvent::GameWon);
        }
        if self.run.game_over() && !self.announced_over {
            self.announced_over = true;
            info!(tick = self.tick, "game over");
            self.log.record(self.tick, CombatEvent::GameOver);
        }
    }

    /// Completes the current clip of `id` immediately, for hosts whose own
    /// animation player reports completion.
    ///
    /// Returns `true` if a one-shot clip was playing.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownEntity`] if `id` is not in the scene.
    /// - [`SimError::Fsm`] on a miswired transition.
    pub fn animation_complete(&mut self, id: EntityId) -> Result<bool, SimError> {
        let entity = self.arena.require_mut(id)?;
        let completed = match entity.inner_mut() {
            EntityInner::Player(player) => {
                let completed = player.animation_complete(&mut self.run, &mut self.events, &self.tuning)?;
                if completed {
                    self.contacts.rearm();
                }
                completed
            }
            EntityInner::Wisp(wisp) => wisp.animation_complete()?,
            EntityInner::Enemy(enemy) => enemy.animation_complete(&mut self.run, &self.tuning)?,
        };
        self.remove_expired();
        self.announce_outcome();
        Ok(completed)
    }

    /// Resets the session: fresh run state, signals and entities from the
    /// scene plan it was built with.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if a state graph is miswired.
    pub fn restart(&mut self) -> Result<(), SimError> {
        self.arena = Arena::new();
        self.run = RunState::new(&self.tuning);
        self.events = EventBus::new();
        self.contacts = ContactResolver::new();
        self.log.clear();
        self.tick = 0;
        self.shown = false;
        self.announced_won = false;
        self.announced_over = false;
        self.populate()?;
        info!("session restarted");
        Ok(())
    }

    /// Queues a signal for delivery at the start of the next tick.
    pub fn emit(&mut self, signal: Signal) {
        self.events.emit(signal);
    }

    /// Returns the arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns the arena mutably, for hosts that write physics results back.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the run state.
    #[must_use]
    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Returns the run state mutably.
    pub fn run_mut(&mut self) -> &mut RunState {
        &mut self.run
    }

    /// Returns the tuning.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Returns the number of ticks run since creation or restart.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns `true` once `StartPlay` has been delivered.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Returns the player.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.arena.player()
    }

    /// Returns the wisp.
    #[must_use]
    pub fn wisp(&self) -> Option<&Wisp> {
        self.arena.wisp()
    }

    /// Returns an enemy by id.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.arena.enemy(id)
    }

    /// Drains the combat log.
    pub fn take_events(&mut self) -> Vec<Record> {
        self.log.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spawns_player_and_wisp() {
        let sim = Simulation::new(Tuning::default()).unwrap();
        assert_eq!(sim.arena().entity_count(), 2);
        assert_eq!(sim.player().unwrap().body().position, Vec2::new(163.0, 2840.0));
        assert!(sim.wisp().is_some());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let tuning = Tuning {
            frame_rate: 0.0,
            ..Tuning::default()
        };
        let err = Simulation::new(tuning).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn spawn_enemy_rejects_non_enemies() {
        let mut sim = Simulation::new(Tuning::default()).unwrap();
        let err = sim.spawn_enemy(Archetype::Wisp, Vec2::ZERO).unwrap_err();
        assert!(matches!(err, SimError::NotAnEnemy(Archetype::Wisp)));
    }

    #[test]
    fn start_play_marks_scene_shown() {
        let mut sim = Simulation::new(Tuning::default()).unwrap();
        sim.emit(Signal::StartPlay);
        assert!(!sim.is_shown());
        sim.step(&Frame::new(), 0.0625).unwrap();
        assert!(sim.is_shown());
    }

    #[test]
    fn animation_complete_reports_unknown_ids() {
        let mut sim = Simulation::new(Tuning::default()).unwrap();
        let err = sim.animation_complete(EntityId::new(99)).unwrap_err();
        assert!(matches!(err, SimError::UnknownEntity(_)));
    }

    #[test]
    fn frame_builder_collects_edges() {
        let frame = Frame::new()
            .with_held(HeldKeys::LEFT)
            .with_input(InputEvent::CastPressed)
            .with_contact(EntityId::new(2));
        assert!(frame.held.contains(HeldKeys::LEFT));
        assert_eq!(frame.inputs, vec![InputEvent::CastPressed]);
        assert_eq!(frame.contacts, vec![EntityId::new(2)]);
    }
}
