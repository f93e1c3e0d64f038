//! The wisp: a light companion that trails the player.
//!
//! It has no intents of its own. It reacts to bus signals and to transitions
//! forced by the health check (flicker when the player is hurt, death when
//! the player dies).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use wispwood_fsm::{Activation, Directive, State, StateMachine, StateNode};

use crate::animation::{Animator, WISP_CLIPS};
use crate::body::{Body, Hitbox};
use crate::config::Tuning;
use crate::entity::{tolerate, Archetype};
use crate::error::SimError;
use crate::events::Signal;

/// Wisp states. They carry no scratch data, so each state is its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WispState {
    /// Hovering.
    Idle,
    /// Glowing while the light spell lasts.
    Illuminate,
    /// Flickering after the player is hit.
    Flicker,
    /// Fading out with the player. Terminal.
    Death,
}

impl WispState {
    /// Returns the clip this state plays.
    #[must_use]
    pub const fn clip(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Illuminate => "illuminate",
            Self::Flicker => "flicker",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for WispState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clip())
    }
}

/// Context for wisp hooks.
pub struct WispCtx<'a> {
    /// The wisp's body.
    pub body: &'a mut Body,
    /// The wisp's animator.
    pub anim: &'a mut Animator,
}

impl StateNode for WispState {
    type Key = Self;

    fn key(&self) -> Self {
        *self
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Death)
    }
}

impl State<WispCtx<'_>> for WispState {
    type Event = Signal;

    fn enter(&mut self, ctx: &mut WispCtx<'_>, activation: Activation) {
        ctx.anim.play(self.clip());
        if matches!(self, Self::Flicker | Self::Death) {
            ctx.anim.watch(activation);
        }
    }

    fn on_complete(&mut self, ctx: &mut WispCtx<'_>) -> Directive<Self> {
        match self {
            Self::Flicker => Directive::Goto(Self::Idle),
            Self::Death => {
                ctx.body.stop();
                ctx.body.visible = false;
                Directive::Stay
            }
            Self::Idle | Self::Illuminate => Directive::Stay,
        }
    }

    fn on_event(&mut self, _ctx: &mut WispCtx<'_>, event: &Signal) -> Directive<Self> {
        match (*self, event) {
            (Self::Idle, Signal::Cast) => Directive::Goto(Self::Illuminate),
            (Self::Illuminate, Signal::CastEnd) => Directive::Goto(Self::Idle),
            _ => Directive::Stay,
        }
    }
}

/// The wisp companion.
#[derive(Debug)]
pub struct Wisp {
    body: Body,
    animator: Animator,
    offset: Vec2,
    machine: StateMachine<WispState>,
}

impl Wisp {
    /// Creates a wisp hovering next to `leader`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if the state graph is miswired.
    pub fn new(leader: Vec2, tuning: &Tuning) -> Result<Self, SimError> {
        let graph = [
            WispState::Idle,
            WispState::Illuminate,
            WispState::Flicker,
            WispState::Death,
        ];
        Ok(Self {
            body: Body::new(leader + tuning.wisp_offset, Hitbox::default()),
            animator: Animator::new(WISP_CLIPS, tuning.frame_rate),
            offset: tuning.wisp_offset,
            machine: StateMachine::new(WispState::Idle, graph)?,
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

    /// Returns the active state.
    #[must_use]
    pub fn state(&self) -> Option<WispState> {
        self.machine.current()
    }

    /// Runs one tick: follow the leader, animate, step, then react to
    /// `signals`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn tick(&mut self, leader: &Body, signals: &[Signal], dt: f32) -> Result<(), SimError> {
        if self.machine.current() != Some(WispState::Death) {
            self.body.position = leader.position + self.offset;
            self.body.facing = leader.facing.opposite();
        }

        let completed = self.animator.advance(dt);
        let Self {
            body,
            animator,
            machine,
            ..
        } = self;
        let mut ctx = WispCtx {
            body,
            anim: animator,
        };

        if let Some(token) = completed.and_then(|done| done.watcher) {
            machine.complete(token, &mut ctx)?;
        }
        machine.step(&mut ctx, dt)?;
        for signal in signals {
            machine.dispatch(signal, &mut ctx)?;
        }
        Ok(())
    }

    /// Runs one paused tick.
    pub fn suspend(&mut self, dt: f32) {
        self.body.stop();
        self.machine.elapse(dt);
    }

    /// Forces a transition requested from outside the state graph.
    ///
    /// A request rejected because the wisp has already faded is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] if `to` is not part of the graph.
    pub fn force(&mut self, to: WispState) -> Result<(), SimError> {
        let Self {
            body,
            animator,
            machine,
            ..
        } = self;
        let mut ctx = WispCtx {
            body,
            anim: animator,
        };
        tolerate(Archetype::Wisp, machine.transition(to, &mut ctx))?;
        Ok(())
    }

    /// Completes the current clip immediately, as reported by an external
    /// animation driver.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fsm`] on a miswired transition.
    pub fn animation_complete(&mut self) -> Result<bool, SimError> {
        let Some(done) = self.animator.finish() else {
            return Ok(false);
        };
        let Self {
            body,
            animator,
            machine,
            ..
        } = self;
        let mut ctx = WispCtx {
            body,
            anim: animator,
        };
        if let Some(token) = done.watcher {
            machine.complete(token, &mut ctx)?;
        }
        Ok(true)
    }
}
