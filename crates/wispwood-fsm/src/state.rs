//! State trait, transition directives and activation tokens.
//!
//! A state is split across two traits:
//! - [`StateNode`]: context-free identity (key, terminal flag) and the
//!   `elapse` hook for countdowns that keep running while logic is suspended.
//! - [`State`]: the lifecycle hooks, generic over the context `C` that the
//!   owning entity builds for every call.
//!
//! Hooks never call back into the machine. Instead, `execute`, `on_complete`
//! and `on_event` return a [`Directive`] that the machine applies after the
//! hook returns, which makes transitions synchronous and non-reentrant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Bound for state keys.
///
/// Any small `Copy` identifier works; archetypes normally use a fieldless enum.
pub trait StateKey: Copy + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> StateKey for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display {}

/// Identifies one entry into a state.
///
/// The machine issues a fresh activation every time a state is entered
/// (including self-transitions) and once more when it halts. Deferred work
/// such as an animation-complete notification carries the activation that
/// requested it; the machine ignores it once the activation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Activation(u64);

impl Activation {
    /// The activation value of a machine that has never entered a state.
    pub const NONE: Self = Self(0);

    /// Creates an activation from a raw counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the activation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activation:{}", self.0)
    }
}

/// What the machine should do after a hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<K> {
    /// Remain in the current state.
    Stay,
    /// Transition to the given state (a full exit/enter cycle, even if it is
    /// the current state).
    Goto(K),
    /// Run the current state's exit hook and stop the machine.
    Halt,
}

impl<K> Default for Directive<K> {
    fn default() -> Self {
        Self::Stay
    }
}

impl<K> Directive<K> {
    /// Returns `true` if the directive keeps the current state.
    #[must_use]
    pub const fn is_stay(&self) -> bool {
        matches!(self, Self::Stay)
    }

    /// Returns `other` when this directive is [`Directive::Stay`].
    ///
    /// Useful for priority chains: the first directive that moves wins.
    #[must_use]
    pub fn or_else(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Stay => other(),
            moving => moving,
        }
    }
}

/// Context-free part of a state.
pub trait StateNode {
    /// Key type naming the states of one graph.
    type Key: StateKey;

    /// Returns the key this state is registered under.
    fn key(&self) -> Self::Key;

    /// Terminal states have no outgoing transitions.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Advances countdowns owned by the current activation.
    ///
    /// Called by the driver every tick, including ticks where logic is
    /// suspended, so timers keep running while `execute` does not.
    fn elapse(&mut self, _dt: f32) {}
}

/// Lifecycle hooks of a state, driven with a context of type `C`.
///
/// Every hook is a no-op by default.
pub trait State<C: ?Sized>: StateNode {
    /// Signal type accepted by [`State::on_event`].
    type Event;

    /// Initialises per-activation data.
    fn enter(&mut self, _ctx: &mut C, _activation: Activation) {}

    /// Runs once per tick while the state is active.
    fn execute(&mut self, _ctx: &mut C, _dt: f32) -> Directive<Self::Key> {
        Directive::Stay
    }

    /// Cleans up before the next state is entered.
    fn exit(&mut self, _ctx: &mut C) {}

    /// Resolves the animation-complete notification requested by this
    /// activation.
    fn on_complete(&mut self, _ctx: &mut C) -> Directive<Self::Key> {
        Directive::Stay
    }

    /// Reacts to a signal from the event bus.
    fn on_event(&mut self, _ctx: &mut C, _event: &Self::Event) -> Directive<Self::Key> {
        Directive::Stay
    }
}
