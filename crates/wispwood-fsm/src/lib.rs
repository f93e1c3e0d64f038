//! # Wispwood FSM
//!
//! Generic finite-state-machine runtime with enter/execute/exit lifecycle
//! hooks.
//!
//! A [`StateMachine`] owns every state of one entity, tracks which one is
//! active and drives the lifecycle:
//!
//! - **Lazy start**: nothing is entered until the first [`StateMachine::step`].
//! - **Synchronous transitions**: the old state's `exit` always finishes before
//!   the new state's `enter`. Self-transitions run the full cycle.
//! - **No re-entrancy**: hooks return a [`Directive`] instead of calling back
//!   into the machine, so a transition can never start inside `enter`/`exit`.
//! - **Activation tokens**: deferred notifications (animation complete) carry
//!   the [`Activation`] that requested them and are dropped once stale.
//! - **Terminal states**: a state can declare itself terminal; leaving it is an
//!   [`FsmError::InvalidTransition`].
//!
//! States are usually a fieldless key enum plus a state enum whose variants
//! carry only the scratch data they need. See [`StateMachine`] for a complete
//! example.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod machine;
pub mod state;

pub use error::FsmError;
pub use machine::StateMachine;
pub use state::{Activation, Directive, State, StateKey, StateNode};
