//! The player character and its state graph.
//!
//! ```text
//! disappear --spawn delay, reversed clip--> idle
//! idle --DEAD--> death   idle --HURT--> hurt   idle --CASTING--> cast
//! idle --ROLLING--> roll idle --ATTACK--> attack1   idle --MOVING--> run
//! run --HURT/ROLLING/ATTACK--> hurt/roll/attack1   run --!MOVING--> idle
//! attack1 --complete, chained--> attack2 --complete, chained--> attack3 --complete--> idle
//! attack1 --complete--> sheathe1 --complete--> idle
//! attack2 --complete--> sheathe2 --complete--> idle
//! hurt, cast, roll --complete--> idle
//! death: terminal; completion freezes the clip and ends the game
//! ```
//!
//! Idle checks its intents in priority order, so a single tick never queues
//! two transitions.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, trace};
use wispwood_fsm::{Activation, Directive, State, StateMachine, StateNode};

use crate::animation::{Animator, Completion, PLAYER_CLIPS};
use crate::body::{Body, Facing, StanceHitbox};
use crate::config::Tuning;
use crate::controller::{Intent, PlayerController};
use crate::entity::{tolerate, Archetype};
use crate::error::SimError;
use crate::events::{EventBus, Signal};
use crate::input::{HeldKeys, InputEvent};
use crate::run_state::RunState;

/// Player hitbox applied on every state entry.
pub const PLAYER_STANCE_HITBOX: StanceHitbox = StanceHitbox::new(28.0, 24.0, 0.0, 5.0, 8.0);

/// Names of the player's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKey {
    /// Standing still.
    Idle,
    /// Moving under keyboard control.
    Run,
    /// First combo swing.
    Attack1,
    /// Recovery after an unchained first swing.
    Sheathe1,
    /// Second combo swing.
    Attack2,
    /// Recovery after an unchained second swing.
    Sheathe2,
    /// Final combo swing.
    Attack3,
    /// Flinching after a hit.
    Hurt,
    /// Dying. Terminal.
    Death,
    /// Casting the light spell.
    Cast,
    /// Dodge roll.
    Roll,
    /// Hidden, waiting to spawn in.
    Disappear,
}

impl PlayerKey {
    /// Returns the clip this state plays.
    #[must_use]
    pub const fn clip(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Attack1 => "attack1",
            Self::Sheathe1 => "sheathe1",
            Self::Attack2 => "attack2",
            Self::Sheathe2 => "sheathe2",
            Self::Attack3 => "attack3",
            Self::Hurt => "hurt",
            Self::Death => "death",
            Self::Cast => "cast",
            Self::Roll => "roll",
            Self::Disappear => "disappear",
        }
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clip())
    }
}

/// Position in the three-swing combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combo {
    /// attack1 / sheathe1.
    First,
    /// attack2 / sheathe2.
    Second,
    /// attack3.
    Third,
}

impl Combo {
    const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }

    const fn attack_key(self) -> PlayerKey {
        match self {
            Self::First => PlayerKey::Attack1,
            Self::Second => PlayerKey::Attack2,
            Self::Third => PlayerKey::Attack3,
        }
    }
}

// =============================================================================
// States
// =============================================================================

/// Everything a player state may touch during a hook.
pub struct PlayerCtx<'a> {
    /// The player's body.
    pub body: &'a mut Body,
    /// The player's animator.
    pub anim: &'a mut Animator,
    /// Intent flags.
    pub controls: &'a mut PlayerController,
    /// Shared run state.
    pub run: &'a mut RunState,
    /// Signal bus.
    pub events: &'a mut EventBus,
    /// Directional keys held this tick.
    pub held: HeldKeys,
    /// Gameplay constants.
    pub tuning: &'a Tuning,
}

/// A player state with its per-activation scratch data.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    /// Hidden until `countdown` runs out, then plays its clip in reverse.
    Disappear {
        /// Seconds left before spawning in; `None` once spawned.
        countdown: Option<f32>,
        /// Activation that watches the reversed clip.
        token: Activation,
    },
    /// Standing still.
    Idle,
    /// Moving.
    Run,
    /// A combo swing.
    Attack {
        /// Which swing.
        combo: Combo,
        /// Damage not yet armed this swing.
        hitting: bool,
        /// The attack button was pressed again during the swing.
        chained: bool,
    },
    /// Recovery after an unchained swing.
    Sheathe {
        /// Which swing is being sheathed.
        combo: Combo,
    },
    /// Flinching.
    Hurt,
    /// Dying.
    Death,
    /// Casting the light spell.
    Cast,
    /// Dodge roll.
    Roll,
}

impl PlayerState {
    /// Every state of the player graph.
    #[must_use]
    pub fn graph() -> Vec<Self> {
        let attack = |combo| Self::Attack {
            combo,
            hitting: false,
            chained: false,
        };
        vec![
            Self::Disappear {
                countdown: None,
                token: Activation::NONE,
            },
            Self::Idle,
            Self::Run,
            attack(Combo::First),
            attack(Combo::Second),
            attack(Combo::Third),
            Self::Sheathe {
                combo: Combo::First,
            },
            Self::Sheathe {
                combo: Combo::Second,
            },
            Self::Hurt,
            Self::Death,
            Self::Cast,
            Self::Roll,
        ]
    }
}

impl StateNode for PlayerState {
    type Key = PlayerKey;

    fn key(&self) -> PlayerKey {
        match self {
            Self::Disappear { .. } => PlayerKey::Disappear,
            Self::Idle => PlayerKey::Idle,
            Self::Run => PlayerKey::Run,
            Self::Attack { combo, .. } => combo.attack_key(),
            Self::Sheathe {
                combo: Combo::First,
            } => PlayerKey::Sheathe1,
            Self::Sheathe { .. } => PlayerKey::Sheathe2,
            Self::Hurt => PlayerKey::Hurt,
            Self::Death => PlayerKey::Death,
            Self::Cast => PlayerKey::Cast,
            Self::Roll => PlayerKey::Roll,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Death)
    }

    fn elapse(&mut self, dt: f32) {
        if let Self::Disappear {
            countdown: Some(left),
            ..
        } = self
        {
            *left -= dt;
        }
    }
}

fn show(ctx: &mut PlayerCtx<'_>, key: PlayerKey, watch: Option<Activation>) {
    ctx.anim.play(key.clip());
    if let Some(activation) = watch {
        ctx.anim.watch(activation);
    }
    ctx.body
        .set_hitbox(PLAYER_STANCE_HITBOX.for_facing(ctx.body.facing));
}

impl State<PlayerCtx<'_>> for PlayerState {
    type Event = Signal;

    fn enter(&mut self, ctx: &mut PlayerCtx<'_>, activation: Activation) {
        let key = self.key();
        match self {
            Self::Disappear { countdown, token } => {
                *countdown = Some(ctx.tuning.spawn_delay);
                *token = activation;
                ctx.body.visible = false;
                ctx.body.stop();
                ctx.body
                    .set_hitbox(PLAYER_STANCE_HITBOX.for_facing(ctx.body.facing));
            }
            Self::Idle | Self::Run => show(ctx, key, None),
            Self::Attack {
                hitting, chained, ..
            } => {
                *hitting = true;
                *chained = false;
                ctx.controls.set(Intent::ATTACK, false);
                show(ctx, key, Some(activation));
            }
            Self::Sheathe { .. } => show(ctx, key, Some(activation)),
            Self::Hurt => {
                ctx.body.velocity.x = 0.0;
                show(ctx, key, Some(activation));
            }
            Self::Death => {
                ctx.body.stop();
                show(ctx, key, Some(activation));
            }
            Self::Cast => {
                ctx.run.try_spend_special();
                ctx.controls.set(Intent::CASTING, false);
                ctx.events.emit(Signal::Cast);
                show(ctx, key, Some(activation));
            }
            Self::Roll => {
                ctx.run.try_spend_special();
                ctx.body.velocity.x =
                    ctx.body.facing.sign() * ctx.tuning.player_speed * ctx.tuning.roll_speed_factor;
                show(ctx, key, Some(activation));
            }
        }
    }

    fn execute(&mut self, ctx: &mut PlayerCtx<'_>, _dt: f32) -> Directive<PlayerKey> {
        match self {
            Self::Idle => {
                ctx.controls.settle_special(ctx.run.special());
                let intents = ctx.controls.intents();
                [
                    (Intent::DEAD, PlayerKey::Death),
                    (Intent::HURT, PlayerKey::Hurt),
                    (Intent::CASTING, PlayerKey::Cast),
                    (Intent::ROLLING, PlayerKey::Roll),
                    (Intent::ATTACK, PlayerKey::Attack1),
                    (Intent::MOVING, PlayerKey::Run),
                ]
                .into_iter()
                .find(|(flag, _)| intents.has(*flag))
                .map_or(Directive::Stay, |(_, to)| Directive::Goto(to))
            }
            Self::Run => {
                ctx.controls.movement(ctx.held, ctx.body, ctx.run.paused());
                ctx.controls.settle_special(ctx.run.special());
                if ctx.controls.has(Intent::HURT) {
                    Directive::Goto(PlayerKey::Hurt)
                } else if ctx.controls.has(Intent::ROLLING) {
                    Directive::Goto(PlayerKey::Roll)
                } else if ctx.controls.has(Intent::ATTACK) {
                    Directive::Goto(PlayerKey::Attack1)
                } else if !ctx.controls.has(Intent::MOVING) {
                    Directive::Goto(PlayerKey::Idle)
                } else {
                    Directive::Stay
                }
            }
            Self::Attack {
                combo,
                hitting,
                chained,
            } => {
                if *hitting && ctx.anim.progress() > ctx.tuning.damage_window {
                    let damage = ctx.tuning.combo_damage[combo.index()];
                    ctx.run.arm_damage(damage);
                    *hitting = false;
                    trace!(swing = %combo.attack_key(), damage, "attack damage armed");
                }
                if *combo == Combo::Third {
                    return Directive::Stay;
                }
                if ctx.controls.has(Intent::ATTACK) {
                    *chained = true;
                    ctx.controls.set(Intent::ATTACK, false);
                }
                if ctx.controls.has(Intent::HURT) {
                    Directive::Goto(PlayerKey::Hurt)
                } else {
                    Directive::Stay
                }
            }
            Self::Disappear { countdown, token } => {
                if countdown.is_some_and(|left| left <= 0.0) {
                    *countdown = None;
                    ctx.body.visible = true;
                    ctx.anim.play_reverse(PlayerKey::Disappear.clip());
                    ctx.anim.watch(*token);
                }
                Directive::Stay
            }
            Self::Sheathe { .. } | Self::Hurt | Self::Death | Self::Cast | Self::Roll => {
                Directive::Stay
            }
        }
    }

    fn exit(&mut self, ctx: &mut PlayerCtx<'_>) {
        match self {
            Self::Run => ctx.body.stop(),
            Self::Attack {
                combo,
                hitting,
                chained,
            } => {
                ctx.run.disarm_damage();
                *hitting = false;
                *chained = false;
                if *combo == Combo::Third {
                    ctx.controls.set(Intent::ATTACK, false);
                }
            }
            Self::Hurt => ctx.controls.set(Intent::HURT, false),
            Self::Cast => ctx.controls.set(Intent::CASTING, false),
            Self::Roll => {
                ctx.controls.set(Intent::ROLLING, false);
                ctx.body.velocity.x = 0.0;
            }
            Self::Disappear { countdown, .. } => {
                *countdown = None;
                ctx.body.visible = true;
            }
            Self::Idle | Self::Sheathe { .. } | Self::Death => {}
        }
    }

    fn on_complete(&mut self, ctx: &mut PlayerCtx<'_>) -> Directive<PlayerKey> {
        match self {
            Self::Attack {
                combo: Combo::First,
                chained,
                ..
            } => Directive::Goto(if *chained {
                PlayerKey::Attack2
            } else {
                PlayerKey::Sheathe1
            }),
            Self::Attack {
                combo: Combo::Second,
                chained,
                ..
            } => Directive::Goto(if *chained {
                PlayerKey::Attack3
            } else {
                PlayerKey::Sheathe2
            }),
            Self::Attack { .. }
            | Self::Sheathe { .. }
            | Self::Hurt
            | Self::Cast
            | Self::Roll
            | Self::Disappear { .. } => Directive::Goto(PlayerKey::Idle),
            Self::Death => {
                ctx.anim.pause();
                ctx.run.mark_game_over();
                info!("player died; game over");
                Directive::Stay
            }
            Self::Idle | Self::Run => Directive::Stay,
        }
    }
}

// =============================================================================
// Player
// =============================================================================

/// The player: body, animator, intents and state machine.
#[derive(Debug)]
pub struct Player {
    body: Body,
    animator: Animator,
    controls: PlayerController,
    last_health: i32,
    machine: StateMachine<PlayerState>,
}

impl Player {
    /// Creates a hidden player at `position`, waiting to spawn in.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if the state graph is miswired.
    pub fn new(position: Vec2, tuning: &Tuning) -> Result<Self, SimError> {
        let mut body = Body::new(position, PLAYER_STANCE_HITBOX.for_facing(Facing::Right));
        body.visible = false;
        Ok(Self {
            body,
            animator: Animator::new(PLAYER_CLIPS, tuning.frame_rate),
            controls: PlayerController::new(tuning),
            last_health: tuning.max_health,
            machine: StateMachine::new(PlayerKey::Disappear, PlayerState::graph())?,
        })
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
    pub fn controls(&self) -> &PlayerController {
        &self.controls
    }

    /// Returns the active state, or `None` before the first tick.
    #[must_use]
    pub fn state(&self) -> Option<PlayerKey> {
        self.machine.current()
    }

    /// Returns the state machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine<PlayerState> {
        &self.machine
    }

    /// Returns the health value seen at the last health check.
    #[must_use]
    pub fn last_health(&self) -> i32 {
        self.last_health
    }

    /// Records the pool value and returns the previous one.
    pub fn observe_health(&mut self, health: i32) -> i32 {
        std::mem::replace(&mut self.last_health, health)
    }

    /// Returns `true` once `DEAD` is set.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.controls.has(Intent::DEAD)
    }

    /// Applies a pointer or key edge.
    pub fn apply_input(&mut self, event: InputEvent, special: u8) {
        self.controls.apply(event, special);
    }

    /// Sets `DEAD` for good.
    pub fn kill(&mut self) {
        self.controls.kill();
    }

    /// Raises `HURT`.
    pub fn flinch(&mut self) {
        self.controls.set(Intent::HURT, true);
    }

    fn split<'a>(
        &'a mut self,
        held: HeldKeys,
        run: &'a mut RunState,
        events: &'a mut EventBus,
        tuning: &'a Tuning,
    ) -> (&'a mut StateMachine<PlayerState>, PlayerCtx<'a>) {
        let Self {
            body,
            animator,
            controls,
            machine,
            ..
        } = self;
        (
            machine,
            PlayerCtx {
                body,
                anim: animator,
                controls,
                run,
                events,
                held,
                tuning,
            },
        )
    }

    /// Runs one unpaused tick.
    ///
    /// Returns `true` if a one-shot clip completed this tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn tick(
        &mut self,
        held: HeldKeys,
        run: &mut RunState,
        events: &mut EventBus,
        tuning: &Tuning,
        dt: f32,
    ) -> Result<bool, SimError> {
        let completed = self.animator.advance(dt);
        if let Some(done) = completed {
            self.resolve_completion(done, held, run, events, tuning)?;
        }

        self.controls.get_actions(self.last_health, held);
        self.machine.elapse(dt);
        let (machine, mut ctx) = self.split(held, run, events, tuning);
        machine.step(&mut ctx, dt)?;

        run.track_player(self.body.position, self.body.facing, tuning.stop_distance);
        Ok(completed.is_some())
    }

    /// Runs one paused tick: velocity is zeroed and only countdowns advance.
    pub fn suspend(&mut self, dt: f32) {
        self.body.stop();
        self.machine.elapse(dt);
    }

    /// Forces a transition requested from outside the state graph.
    ///
    /// A request rejected because the player is already dead is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if `to` is not part of the graph.
    pub fn force(
        &mut self,
        to: PlayerKey,
        run: &mut RunState,
        events: &mut EventBus,
        tuning: &Tuning,
    ) -> Result<(), SimError> {
        let (machine, mut ctx) = self.split(HeldKeys::empty(), run, events, tuning);
        tolerate(Archetype::Player, machine.transition(to, &mut ctx))?;
        Ok(())
    }

    /// Completes the current clip immediately, as reported by an external
    /// animation driver.
    ///
    /// Returns `true` if a one-shot clip was playing.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn animation_complete(
        &mut self,
        run: &mut RunState,
        events: &mut EventBus,
        tuning: &Tuning,
    ) -> Result<bool, SimError> {
        match self.animator.finish() {
            Some(done) => {
                self.resolve_completion(done, HeldKeys::empty(), run, events, tuning)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn resolve_completion(
        &mut self,
        done: Completion,
        held: HeldKeys,
        run: &mut RunState,
        events: &mut EventBus,
        tuning: &Tuning,
    ) -> Result<(), SimError> {
        if let Some(token) = done.watcher {
            let (machine, mut ctx) = self.split(held, run, events, tuning);
            machine.complete(token, &mut ctx)?;
        }
        Ok(())
    }
}
