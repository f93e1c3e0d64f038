//! # Wispwood Core
//!
//! Headless entity simulation for Wispwood: the player, the wisp companion
//! and the forest's enemies, each driven by a state machine from
//! [`wispwood_fsm`].
//!
//! ## Architecture
//!
//! - **Controllers** turn raw input and proximity into intent flags.
//! - **Entities** own a body, an animation clock and a state machine whose
//!   states read those flags.
//! - **Resolvers** apply what no single entity owns: player swings against
//!   touching enemies, and health changes against the player.
//! - **Run state** is the per-session context (health pool, special resource,
//!   pause and outcome flags) passed explicitly to every hook that needs it.
//!
//! Rendering, sprite playback, collision and input polling stay with the
//! host. It reports held keys, input edges and contacts through a
//! [`simulation::Frame`] and reads bodies and clip names back.
//!
//! ## Usage
//!
//! ```
//! use glam::Vec2;
//! use wispwood_core::config::Tuning;
//! use wispwood_core::entity::Archetype;
//! use wispwood_core::input::HeldKeys;
//! use wispwood_core::simulation::{Frame, Simulation};
//!
//! let tuning = Tuning { spawn_delay: 0.0, ..Tuning::default() };
//! let mut sim = Simulation::new(tuning).unwrap();
//! sim.spawn_enemy(Archetype::Leshy, Vec2::new(600.0, 2840.0)).unwrap();
//!
//! let frame = Frame::new().with_held(HeldKeys::RIGHT);
//! for _ in 0..60 {
//!     sim.step(&frame, 1.0 / 60.0).unwrap();
//! }
//! assert_eq!(sim.run().health(), 100);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod arena;
pub mod body;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod events;
pub mod input;
pub mod resolver;
pub mod run_state;
pub mod scene;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use config::{ConfigError, Tuning};
pub use entity::{Archetype, Entity, EntityId};
pub use error::SimError;
pub use run_state::RunState;
pub use simulation::{Frame, Simulation};
