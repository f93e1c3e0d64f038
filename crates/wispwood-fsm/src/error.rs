//! Error types for state-machine wiring and transitions.

use thiserror::Error;

/// Errors reported by a [`StateMachine`](crate::StateMachine).
///
/// `UnknownState` and `DuplicateState` indicate a wiring bug between a state
/// graph and the code that drives it; callers should surface them instead of
/// swallowing them. `InvalidTransition` and `Halted` are reported so that the
/// caller can decide to ignore them (e.g. a forced "hurt" arriving after the
/// entity has already died).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// The requested state is not registered with the machine.
    #[error("state `{0}` is not registered with this machine")]
    UnknownState(String),

    /// Two states with the same key were registered.
    #[error("state `{0}` is registered more than once")]
    DuplicateState(String),

    /// The current state is terminal and has no outgoing transitions.
    #[error("cannot leave terminal state `{from}` for `{to}`")]
    InvalidTransition {
        /// Key of the terminal state.
        from: String,
        /// Key of the rejected target.
        to: String,
    },

    /// The machine has halted and accepts no further transitions.
    #[error("machine has halted; cannot enter `{0}`")]
    Halted(String),
}

impl FsmError {
    /// Returns `true` for errors that indicate a wiring bug.
    ///
    /// Non-fatal errors describe a request that arrived too late (the machine
    /// already reached a terminal state) and can be dropped by the caller.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownState(_) | Self::DuplicateState(_))
    }
}
