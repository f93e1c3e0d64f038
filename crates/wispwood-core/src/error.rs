//! Simulation errors.

use thiserror::Error;
use wispwood_fsm::FsmError;

use crate::config::ConfigError;
use crate::entity::{Archetype, EntityId};

/// Errors surfaced by the simulation.
///
/// Gameplay edge cases (clamped health, a forced transition rejected by a
/// terminal state) never reach this type; they are handled where they occur.
#[derive(Debug, Error)]
pub enum SimError {
    /// A state machine was wired incorrectly.
    #[error(transparent)]
    Fsm(#[from] FsmError),

    /// No entity with this id exists.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The archetype cannot be spawned as an enemy.
    #[error("{0} is not an enemy archetype")]
    NotAnEnemy(Archetype),

    /// Configuration or scene plan failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimError {
    /// Returns `true` if the error indicates a wiring bug rather than bad
    /// input.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Fsm(err) => err.is_fatal(),
            Self::UnknownEntity(_) | Self::NotAnEnemy(_) | Self::Config(_) => false,
        }
    }
}
