//! Test helpers for setting up scenes and driving them tick by tick.

use glam::Vec2;
use tracing::Level;

use crate::config::Tuning;
use crate::entity::{Archetype, EntityId, PlayerKey};
use crate::input::{InputEvent, PointerButton};
use crate::scene::ScenePlan;
use crate::simulation::{Frame, Simulation};

/// Tick length used by every scenario. Exact in binary, so clip and countdown
/// arithmetic lands on whole ticks.
pub const DT: f32 = 0.0625;

/// Far enough from the default player spawn that enemies neither follow nor
/// attack.
pub const FAR_AWAY: Vec2 = Vec2::new(2000.0, 100.0);

/// Installs a test-writer subscriber once per process. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

/// Default tuning with the spawn-in delay removed.
pub fn quick_tuning() -> Tuning {
    Tuning {
        spawn_delay: 0.0,
        ..Tuning::default()
    }
}

/// Tuning where the first combo swing kills any enemy outright.
pub fn lethal_tuning() -> Tuning {
    Tuning {
        combo_damage: [100, 15, 20],
        ..quick_tuning()
    }
}

/// Quick tuning where the session starts with `special`.
pub fn special_tuning(special: u8) -> Tuning {
    Tuning {
        initial_special: special,
        ..quick_tuning()
    }
}

/// Builds a scene with `tuning` and runs it until the player stands idle.
pub fn ready_sim_with(tuning: Tuning) -> Simulation {
    init_tracing();
    let mut sim = Simulation::from_scene(tuning, ScenePlan::default()).unwrap();
    let spawned = step_until(&mut sim, &Frame::new(), 40, |s| {
        s.player().and_then(|p| p.state()) == Some(PlayerKey::Idle)
    });
    assert!(spawned, "player never finished spawning in");
    sim.take_events();
    sim
}

/// A scene that finished spawning in, with no enemies.
pub fn ready_sim() -> Simulation {
    ready_sim_with(quick_tuning())
}

/// Adds an enemy `offset` away from the player's published target position.
pub fn spawn_near_player(sim: &mut Simulation, archetype: Archetype, offset: Vec2) -> EntityId {
    let target = sim.run().player_target();
    sim.spawn_enemy(archetype, target + offset).unwrap()
}

/// Runs `ticks` steps with the same frame.
pub fn run_ticks(sim: &mut Simulation, frame: &Frame, ticks: usize) {
    for _ in 0..ticks {
        sim.step(frame, DT).unwrap();
    }
}

/// Steps until `done` holds, at most `max` times. Returns whether it held.
pub fn step_until<F>(sim: &mut Simulation, frame: &Frame, max: usize, done: F) -> bool
where
    F: Fn(&Simulation) -> bool,
{
    for _ in 0..max {
        if done(sim) {
            return true;
        }
        sim.step(frame, DT).unwrap();
    }
    done(sim)
}

/// A frame carrying a primary-button press.
pub fn click() -> Frame {
    Frame::new().with_input(InputEvent::PointerDown(PointerButton::Primary))
}

/// Returns the player's state.
pub fn player_state(sim: &Simulation) -> Option<PlayerKey> {
    sim.player().and_then(|p| p.state())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_sim_is_idle_and_visible() {
        let sim = ready_sim();
        let player = sim.player().unwrap();
        assert_eq!(player.state(), Some(PlayerKey::Idle));
        assert!(player.body().visible);
        assert!(sim.tick() > 0);
    }

    #[test]
    fn spawn_near_player_offsets_from_target() {
        let mut sim = ready_sim();
        let id = spawn_near_player(&mut sim, Archetype::Twig, Vec2::new(10.0, 0.0));
        let target = sim.run().player_target();
        assert_eq!(sim.enemy(id).unwrap().body().position, target + Vec2::new(10.0, 0.0));
    }

    #[test]
    fn step_until_reports_timeouts() {
        let mut sim = ready_sim();
        assert!(!step_until(&mut sim, &Frame::new(), 3, |_| false));
    }
}
