//! Per-session run state.
//!
//! One [`RunState`] exists per session. The simulation owns it and lends it to
//! states and resolvers as an explicit context handle. Every mutation clamps:
//! health stays in `[0, max_health]` and the special resource in
//! `[0, max_special]`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::Facing;
use crate::config::Tuning;

/// Shared health pool, attack damage, pause and win/lose flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    health: i32,
    max_health: i32,
    pending_damage: i32,
    special: u8,
    max_special: u8,
    paused: bool,
    game_over: bool,
    game_won: bool,
    player_target: Vec2,
}

impl RunState {
    /// Creates a fresh run: full health, the starting special, unpaused.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            health: tuning.max_health,
            max_health: tuning.max_health,
            pending_damage: 0,
            special: tuning.initial_special.min(tuning.max_special),
            max_special: tuning.max_special,
            paused: false,
            game_over: false,
            game_won: false,
            player_target: Vec2::ZERO,
        }
    }

    // -------------------------------------------------------------------------
    // Health
    // -------------------------------------------------------------------------

    /// Returns the shared health pool.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Returns the health ceiling.
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Lowers the pool by `damage`, clamped at zero.
    ///
    /// Does nothing once the pool is empty. Negative damage counts as zero.
    pub fn take_hit(&mut self, damage: i32) {
        if self.health > 0 {
            self.health = (self.health - damage.max(0)).clamp(0, self.max_health);
        }
    }

    /// Raises the pool by `amount`, clamped at the ceiling.
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount.max(0)).clamp(0, self.max_health);
    }

    // -------------------------------------------------------------------------
    // Special resource
    // -------------------------------------------------------------------------

    /// Returns the special resource count.
    #[must_use]
    pub fn special(&self) -> u8 {
        self.special
    }

    /// Adds `amount` special, clamped at the ceiling.
    pub fn grant_special(&mut self, amount: u8) {
        self.special = self.special.saturating_add(amount).min(self.max_special);
    }

    /// Spends one special if any is left. Returns whether it was spent.
    pub fn try_spend_special(&mut self) -> bool {
        if self.special == 0 {
            return false;
        }
        self.special -= 1;
        true
    }

    // -------------------------------------------------------------------------
    // Pending attack damage
    // -------------------------------------------------------------------------

    /// Returns the armed attack damage (zero when disarmed).
    #[must_use]
    pub fn pending_damage(&self) -> i32 {
        self.pending_damage
    }

    /// Arms the player's attack damage.
    pub fn arm_damage(&mut self, damage: i32) {
        self.pending_damage = damage.max(0);
    }

    /// Disarms the player's attack damage.
    pub fn disarm_damage(&mut self) {
        self.pending_damage = 0;
    }

    /// Reads and disarms the pending damage.
    pub fn take_pending_damage(&mut self) -> i32 {
        std::mem::take(&mut self.pending_damage)
    }

    // -------------------------------------------------------------------------
    // Flow
    // -------------------------------------------------------------------------

    /// Returns `true` while paused.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Sets the pause flag.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Returns `true` once the player's death has finished.
    #[must_use]
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Ends the run in defeat.
    pub fn mark_game_over(&mut self) {
        self.game_over = true;
    }

    /// Returns `true` once the boss has died.
    #[must_use]
    pub fn game_won(&self) -> bool {
        self.game_won
    }

    /// Ends the run in victory.
    pub fn mark_game_won(&mut self) {
        self.game_won = true;
    }

    /// Drops the pool to zero. Used after game over.
    pub fn pin_health_to_zero(&mut self) {
        self.health = 0;
    }

    // -------------------------------------------------------------------------
    // Player tracking
    // -------------------------------------------------------------------------

    /// Returns the position enemies steer towards.
    #[must_use]
    pub fn player_target(&self) -> Vec2 {
        self.player_target
    }

    /// Publishes the player position, led by `stop_distance` in the facing
    /// direction so enemies stop just in front of the player.
    pub fn track_player(&mut self, position: Vec2, facing: Facing, stop_distance: f32) {
        self.player_target = Vec2::new(position.x + facing.sign() * stop_distance, position.y);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_run_is_full_health_and_full_special() {
        let run = RunState::default();
        assert_eq!(run.health(), 100);
        assert_eq!(run.special(), 3);
        assert!(!run.paused());
        assert!(!run.game_over());
        assert!(!run.game_won());
    }

    #[test]
    fn overkill_clamps_to_zero() {
        let mut run = RunState::default();
        run.take_hit(88);
        assert_eq!(run.health(), 12);
        run.take_hit(15);
        assert_eq!(run.health(), 0);
    }

    #[test]
    fn heal_clamps_to_ceiling() {
        let mut run = RunState::default();
        run.take_hit(3);
        run.heal(5);
        assert_eq!(run.health(), 100);
    }

    #[test]
    fn special_spend_requires_stock() {
        let mut run = RunState::new(&Tuning {
            initial_special: 0,
            ..Tuning::default()
        });
        assert!(!run.try_spend_special());
        run.grant_special(5);
        assert_eq!(run.special(), 3);
        assert!(run.try_spend_special());
        assert_eq!(run.special(), 2);
    }

    #[test]
    fn pending_damage_reads_once() {
        let mut run = RunState::default();
        run.arm_damage(15);
        assert_eq!(run.take_pending_damage(), 15);
        assert_eq!(run.take_pending_damage(), 0);
    }

    #[test]
    fn tracked_target_leads_by_facing() {
        let mut run = RunState::default();
        run.track_player(Vec2::new(100.0, 50.0), Facing::Left, 40.0);
        assert_eq!(run.player_target(), Vec2::new(60.0, 50.0));
        run.track_player(Vec2::new(100.0, 50.0), Facing::Right, 40.0);
        assert_eq!(run.player_target(), Vec2::new(140.0, 50.0));
    }

    #[test]
    fn toggle_pause_flips() {
        let mut run = RunState::default();
        assert!(run.toggle_pause());
        assert!(!run.toggle_pause());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Hit(i32),
        Heal(i32),
        Grant(u8),
        Spend,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50..200_i32).prop_map(Op::Hit),
            (-50..200_i32).prop_map(Op::Heal),
            any::<u8>().prop_map(Op::Grant),
            Just(Op::Spend),
        ]
    }

    proptest! {
        #[test]
        fn health_and_special_stay_clamped(ops in prop::collection::vec(op(), 0..64)) {
            let mut run = RunState::default();
            for op in ops {
                match op {
                    Op::Hit(d) => run.take_hit(d),
                    Op::Heal(h) => run.heal(h),
                    Op::Grant(s) => run.grant_special(s),
                    Op::Spend => {
                        run.try_spend_special();
                    }
                }
                prop_assert!((0..=100).contains(&run.health()));
                prop_assert!(run.special() <= 3);
            }
        }
    }
}
