//! Enemies and their shared state graph.
//!
//! ```text
//! idle --MOVING--> run --!MOVING--> idle
//! idle --in melee range for attack_delay, not dead--> attack --complete--> idle
//! any --hit--> hurt --complete--> idle
//! any --killed--> death --complete--> halt (reward, removal)
//! ```
//!
//! Boss, twig and leshy share the graph and differ only in their
//! [`EnemyProfile`].

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use wispwood_fsm::{Activation, Directive, State, StateMachine, StateNode};

use crate::animation::{Animator, Completion};
use crate::body::Body;
use crate::config::Tuning;
use crate::controller::{EnemyController, Intent, Tracking};
use crate::entity::{tolerate, EnemyProfile};
use crate::error::SimError;
use crate::events::Signal;
use crate::run_state::RunState;

/// Names of enemy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKey {
    /// Waiting.
    Idle,
    /// Chasing.
    Run,
    /// Swinging at the player.
    Attack,
    /// Flinching.
    Hurt,
    /// Dying. Terminal.
    Death,
}

impl EnemyKey {
    /// Returns the clip this state plays.
    #[must_use]
    pub const fn clip(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Attack => "attack",
            Self::Hurt => "hurt",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for EnemyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clip())
    }
}

/// Context for enemy hooks.
pub struct EnemyCtx<'a> {
    /// The enemy's body.
    pub body: &'a mut Body,
    /// The enemy's animator.
    pub anim: &'a mut Animator,
    /// Intent flags.
    pub controls: &'a mut EnemyController,
    /// Distance to the player as of the last `get_actions`.
    pub tracking: &'a Tracking,
    /// Archetype data.
    pub profile: &'a EnemyProfile,
    /// Shared run state.
    pub run: &'a mut RunState,
    /// Gameplay constants.
    pub tuning: &'a Tuning,
}

/// An enemy state with its per-activation scratch data.
#[derive(Debug, Clone, PartialEq)]
pub enum EnemyState {
    /// Waiting; counts down once the player is in melee range.
    Idle {
        /// Seconds until the attack, once the target was found.
        countdown: Option<f32>,
    },
    /// Chasing.
    Run,
    /// Swinging.
    Attack {
        /// The swing can still land.
        hitting: bool,
    },
    /// Flinching.
    Hurt,
    /// Dying.
    Death,
}

impl EnemyState {
    /// Every state of the enemy graph.
    #[must_use]
    pub fn graph() -> [Self; 5] {
        [
            Self::Idle { countdown: None },
            Self::Run,
            Self::Attack { hitting: false },
            Self::Hurt,
            Self::Death,
        ]
    }
}

impl StateNode for EnemyState {
    type Key = EnemyKey;

    fn key(&self) -> EnemyKey {
        match self {
            Self::Idle { .. } => EnemyKey::Idle,
            Self::Run => EnemyKey::Run,
            Self::Attack { .. } => EnemyKey::Attack,
            Self::Hurt => EnemyKey::Hurt,
            Self::Death => EnemyKey::Death,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Death)
    }

    fn elapse(&mut self, dt: f32) {
        if let Self::Idle {
            countdown: Some(left),
        } = self
        {
            *left -= dt;
        }
    }
}

impl State<EnemyCtx<'_>> for EnemyState {
    type Event = Signal;

    fn enter(&mut self, ctx: &mut EnemyCtx<'_>, activation: Activation) {
        ctx.anim.play(self.key().clip());
        match self {
            Self::Idle { countdown } => *countdown = None,
            Self::Run => {}
            Self::Attack { hitting } => {
                *hitting = true;
                if let Some(stance) = ctx.profile.attack_hitbox {
                    ctx.body.set_hitbox(stance.for_facing(ctx.body.facing));
                }
                ctx.anim.watch(activation);
            }
            Self::Hurt | Self::Death => {
                ctx.body.stop();
                ctx.anim.watch(activation);
            }
        }
    }

    fn execute(&mut self, ctx: &mut EnemyCtx<'_>, _dt: f32) -> Directive<EnemyKey> {
        match self {
            Self::Idle { countdown } => {
                if ctx.controls.has(Intent::MOVING) {
                    return Directive::Goto(EnemyKey::Run);
                }
                match *countdown {
                    Some(left) if left <= 0.0 => {
                        *countdown = None;
                        if ctx.controls.has(Intent::DEAD) {
                            Directive::Stay
                        } else {
                            Directive::Goto(EnemyKey::Attack)
                        }
                    }
                    Some(_) => Directive::Stay,
                    None => {
                        if ctx.tracking.in_melee() && ctx.run.health() > 0 {
                            *countdown = Some(ctx.tuning.attack_delay);
                        }
                        Directive::Stay
                    }
                }
            }
            Self::Run => {
                if ctx.controls.has(Intent::MOVING) {
                    Directive::Stay
                } else {
                    Directive::Goto(EnemyKey::Idle)
                }
            }
            Self::Attack { hitting } => {
                ctx.body.stop();
                if ctx.controls.has(Intent::HURT) || ctx.controls.has(Intent::DEAD) {
                    *hitting = false;
                }
                Directive::Stay
            }
            Self::Hurt | Self::Death => Directive::Stay,
        }
    }

    fn exit(&mut self, ctx: &mut EnemyCtx<'_>) {
        match self {
            Self::Idle { countdown } => *countdown = None,
            Self::Run => ctx.body.stop(),
            Self::Attack { hitting } => {
                *hitting = false;
                if ctx.profile.attack_hitbox.is_some() {
                    ctx.body.set_hitbox(ctx.profile.hitbox);
                }
            }
            Self::Hurt => ctx.controls.set(Intent::HURT, false),
            Self::Death => {
                ctx.body.visible = false;
                ctx.run.grant_special(ctx.tuning.kill_special);
                ctx.run.heal(ctx.tuning.kill_heal);
                info!(
                    archetype = %ctx.profile.archetype,
                    health = ctx.run.health(),
                    special = ctx.run.special(),
                    "enemy died"
                );
                if ctx.profile.wins_game {
                    ctx.run.mark_game_won();
                    info!("boss defeated; game won");
                }
            }
        }
    }

    fn on_complete(&mut self, ctx: &mut EnemyCtx<'_>) -> Directive<EnemyKey> {
        match self {
            Self::Attack { hitting } => {
                if *hitting && ctx.tracking.in_melee() {
                    ctx.run.take_hit(ctx.profile.damage);
                    debug!(
                        archetype = %ctx.profile.archetype,
                        damage = ctx.profile.damage,
                        health = ctx.run.health(),
                        "enemy swing landed"
                    );
                }
                Directive::Goto(EnemyKey::Idle)
            }
            Self::Hurt => Directive::Goto(EnemyKey::Idle),
            Self::Death => Directive::Halt,
            Self::Idle { .. } | Self::Run => Directive::Stay,
        }
    }
}

// =============================================================================
// Enemy
// =============================================================================

/// Result of a landed player hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The enemy survived and flinches.
    Hurt,
    /// The enemy's health ran out.
    Killed,
}

/// An enemy of any archetype.
#[derive(Debug)]
pub struct Enemy {
    profile: EnemyProfile,
    body: Body,
    animator: Animator,
    controls: EnemyController,
    tracking: Tracking,
    health: i32,
    max_health: i32,
    machine: StateMachine<EnemyState>,
}

impl Enemy {
    /// Creates an enemy at full health.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if the state graph is miswired.
    pub fn new(profile: EnemyProfile, position: Vec2, tuning: &Tuning) -> Result<Self, SimError> {
        Ok(Self {
            body: Body::new(position, profile.hitbox),
            animator: Animator::new(profile.clips, tuning.frame_rate),
            controls: EnemyController::new(tuning),
            tracking: Tracking::new(tuning.melee_offset),
            health: tuning.max_health,
            max_health: tuning.max_health,
            machine: StateMachine::new(EnemyKey::Idle, EnemyState::graph())?,
            profile,
        })
    }

    /// Returns the archetype profile.
    #[must_use]
    pub fn profile(&self) -> &EnemyProfile {
        &self.profile
    }

    /// Returns the damage this enemy deals per landed swing.
    #[must_use]
    pub fn damage(&self) -> i32 {
        self.profile.damage
    }

    /// Returns the enemy's own health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the body mutably.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Returns the animator.
    #[must_use]
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Returns the intent flags.
    #[must_use]
    pub fn controls(&self) -> &EnemyController {
        &self.controls
    }

    /// Returns what the enemy knows about its target.
    #[must_use]
    pub fn tracking(&self) -> &Tracking {
        &self.tracking
    }

    /// Returns the active state.
    #[must_use]
    pub fn state(&self) -> Option<EnemyKey> {
        self.machine.current()
    }

    /// Returns the state machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine<EnemyState> {
        &self.machine
    }

    /// Returns `true` once `DEAD` is set.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.controls.has(Intent::DEAD)
    }

    /// Returns `true` once the death clip has finished and the enemy can be
    /// removed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.machine.is_halted()
    }

    fn split<'a>(
        &'a mut self,
        run: &'a mut RunState,
        tuning: &'a Tuning,
    ) -> (&'a mut StateMachine<EnemyState>, EnemyCtx<'a>) {
        let Self {
            profile,
            body,
            animator,
            controls,
            tracking,
            machine,
            ..
        } = self;
        (
            machine,
            EnemyCtx {
                body,
                anim: animator,
                controls,
                tracking,
                profile,
                run,
                tuning,
            },
        )
    }

    /// Runs one unpaused tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn tick(&mut self, run: &mut RunState, tuning: &Tuning, dt: f32) -> Result<(), SimError> {
        if let Some(done) = self.animator.advance(dt) {
            self.resolve_completion(done, run, tuning)?;
        }

        if !self.is_dead() && !self.machine.is_halted() {
            self.controls.get_actions(
                &mut self.body,
                &mut self.tracking,
                run.player_target(),
                self.profile.aim_lift,
            );
            let (machine, mut ctx) = self.split(run, tuning);
            machine.step(&mut ctx, dt)?;
        }

        self.machine.elapse(dt);
        Ok(())
    }

    /// Runs one paused tick.
    pub fn suspend(&mut self, dt: f32) {
        self.body.stop();
        self.machine.elapse(dt);
    }

    /// Applies a landed player hit: lower health, then force hurt or death.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn receive_hit(
        &mut self,
        damage: i32,
        run: &mut RunState,
        tuning: &Tuning,
    ) -> Result<HitOutcome, SimError> {
        self.health = (self.health - damage.max(0)).clamp(0, self.max_health);
        let archetype = self.profile.archetype;

        let (outcome, to) = if self.health <= 0 {
            self.controls.kill();
            (HitOutcome::Killed, EnemyKey::Death)
        } else {
            self.controls.set(Intent::HURT, true);
            (HitOutcome::Hurt, EnemyKey::Hurt)
        };

        let (machine, mut ctx) = self.split(run, tuning);
        tolerate(archetype, machine.transition(to, &mut ctx))?;
        Ok(outcome)
    }

    /// Completes the current clip immediately, as reported by an external
    /// animation driver.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn animation_complete(&mut self, run: &mut RunState, tuning: &Tuning) -> Result<bool, SimError> {
        match self.animator.finish() {
            Some(done) => {
                self.resolve_completion(done, run, tuning)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn resolve_completion(
        &mut self,
        done: Completion,
        run: &mut RunState,
        tuning: &Tuning,
    ) -> Result<(), SimError> {
        if let Some(token) = done.watcher {
            let (machine, mut ctx) = self.split(run, tuning);
            machine.complete(token, &mut ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Facing, Hitbox};

    const DT: f32 = 0.0625;

    struct Rig {
        enemy: Enemy,
        run: RunState,
        tuning: Tuning,
    }

    impl Rig {
        /// Enemy at the origin with the tracked player at `target`.
        fn new(profile: EnemyProfile, target: Vec2) -> Self {
            let tuning = Tuning::default();
            let mut run = RunState::new(&tuning);
            run.track_player(target, Facing::Right, 0.0);
            Self {
                enemy: Enemy::new(profile, Vec2::ZERO, &tuning).unwrap(),
                run,
                tuning,
            }
        }

        fn tick(&mut self) {
            self.enemy.tick(&mut self.run, &self.tuning, DT).unwrap();
        }

        fn ticks(&mut self, n: usize) {
            for _ in 0..n {
                self.tick();
            }
        }

        fn hit(&mut self, damage: i32) -> HitOutcome {
            self.enemy
                .receive_hit(damage, &mut self.run, &self.tuning)
                .unwrap()
        }
    }

    mod chase_tests {
        use super::*;

        #[test]
        fn chases_into_run_and_back() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(80.0, 26.0));
            rig.tick();
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Run));
            assert!(rig.enemy.body().velocity.x > 0.0);

            rig.run.track_player(Vec2::new(20.0, 16.0), Facing::Right, 0.0);
            rig.tick();
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));
            assert_eq!(rig.enemy.body().velocity, Vec2::ZERO);
        }

        #[test]
        fn out_of_range_stays_idle() {
            let mut rig = Rig::new(EnemyProfile::leshy(), Vec2::new(500.0, 500.0));
            rig.ticks(40);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));
            assert_eq!(rig.run.health(), 100);
        }
    }

    mod attack_tests {
        use super::*;

        #[test]
        fn attacks_after_the_delay_and_lands() {
            let mut rig = Rig::new(EnemyProfile::leshy(), Vec2::new(10.0, 10.0));
            rig.tick();
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));

            // 1.0 s countdown = 16 ticks
            rig.ticks(15);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));
            rig.ticks(2);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Attack));

            // leshy attack: 7 frames = 0.7 s
            rig.ticks(12);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));
            assert_eq!(rig.run.health(), 90);
        }

        #[test]
        fn swing_misses_when_target_left() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(10.0, 10.0));
            rig.ticks(18);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Attack));

            rig.run.track_player(Vec2::new(90.0, 10.0), Facing::Right, 0.0);
            rig.ticks(12);
            assert_eq!(rig.run.health(), 100);
        }

        #[test]
        fn boss_swaps_hitbox_while_attacking() {
            let mut rig = Rig::new(EnemyProfile::boss(), Vec2::new(10.0, 10.0));
            rig.ticks(18);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Attack));
            assert_eq!(rig.enemy.body().hitbox, Hitbox::new(47.0, 38.0, 14.0, 27.0));

            rig.ticks(10);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Idle));
            assert_eq!(rig.enemy.body().hitbox, EnemyProfile::boss().hitbox);
            assert_eq!(rig.run.health(), 85);
        }

        #[test]
        fn hurt_mid_swing_cancels_the_hit() {
            let mut rig = Rig::new(EnemyProfile::leshy(), Vec2::new(10.0, 10.0));
            rig.ticks(18);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Attack));

            assert_eq!(rig.hit(10), HitOutcome::Hurt);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Hurt));
            rig.ticks(12);
            assert_eq!(rig.run.health(), 100);
        }

        #[test]
        fn countdown_is_cancelled_when_idle_exits() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(10.0, 10.0));
            rig.ticks(8);
            assert!(matches!(
                rig.enemy.machine().current_state(),
                Some(EnemyState::Idle {
                    countdown: Some(_)
                })
            ));

            rig.hit(5);
            assert!(matches!(
                rig.enemy.machine().state(EnemyKey::Idle),
                Some(EnemyState::Idle { countdown: None })
            ));
        }
    }

    mod death_tests {
        use super::*;

        #[test]
        fn lethal_hit_goes_straight_to_death() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(500.0, 500.0));
            rig.tick();
            rig.hit(88);
            assert_eq!(rig.enemy.health(), 12);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Hurt));

            assert_eq!(rig.hit(15), HitOutcome::Killed);
            assert_eq!(rig.enemy.health(), 0);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Death));
            assert!(rig.enemy.is_dead());
        }

        #[test]
        fn hits_after_death_are_dropped() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(500.0, 500.0));
            rig.hit(200);
            rig.hit(10);
            assert_eq!(rig.enemy.state(), Some(EnemyKey::Death));
        }

        #[test]
        fn death_completion_rewards_and_expires() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(10.0, 10.0));
            rig.run.take_hit(20);
            assert!(rig.run.try_spend_special());
            assert_eq!(rig.run.special(), 2);
            rig.hit(100);
            assert!(!rig.enemy.is_expired());

            // twig death: 5 frames = 0.5 s
            rig.ticks(8);
            assert!(rig.enemy.is_expired());
            assert!(!rig.enemy.body().visible);
            assert_eq!(rig.run.special(), 3);
            assert_eq!(rig.run.health(), 85);
            assert!(!rig.run.game_won());
        }

        #[test]
        fn dead_enemy_does_not_chase() {
            let mut rig = Rig::new(EnemyProfile::twig(), Vec2::new(80.0, 10.0));
            rig.hit(100);
            rig.ticks(3);
            assert_eq!(rig.enemy.body().velocity, Vec2::ZERO);
            assert!(!rig.enemy.controls().has(Intent::MOVING));
        }

        #[test]
        fn boss_death_wins_the_game() {
            let mut rig = Rig::new(EnemyProfile::boss(), Vec2::new(500.0, 500.0));
            rig.hit(100);
            assert!(rig.enemy.animation_complete(&mut rig.run, &rig.tuning).unwrap());
            assert!(rig.enemy.is_expired());
            assert!(rig.run.game_won());
        }
    }
}
