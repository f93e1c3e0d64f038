//! Input consumed from the host.
//!
//! The host polls its devices and hands the core a [`HeldKeys`] snapshot plus
//! the discrete [`InputEvent`]s that happened since the previous tick.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Directional keys currently held down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct HeldKeys: u8 {
        /// Move up (-y).
        const UP = 1;
        /// Move down (+y).
        const DOWN = 1 << 1;
        /// Move left (-x).
        const LEFT = 1 << 2;
        /// Move right (+x).
        const RIGHT = 1 << 3;
    }
}

impl HeldKeys {
    /// Returns `true` if any directional key is held.
    #[must_use]
    pub fn any_direction(self) -> bool {
        !self.is_empty()
    }

    /// Returns `true` if `key` is held.
    #[must_use]
    pub fn is_down(self, key: Self) -> bool {
        self.contains(key)
    }

    /// Returns `true` if `key` is not held.
    #[must_use]
    pub fn is_up(self, key: Self) -> bool {
        !self.contains(key)
    }
}

/// Pointer buttons the player uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Primary (left) button: attack.
    Primary,
    /// Secondary (right) button: roll.
    Secondary,
}

/// A discrete input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// A pointer button was pressed.
    PointerDown(PointerButton),
    /// A pointer button was released.
    PointerUp(PointerButton),
    /// The cast key was pressed.
    CastPressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_queries() {
        let keys = HeldKeys::UP | HeldKeys::LEFT;
        assert!(keys.any_direction());
        assert!(keys.is_down(HeldKeys::UP));
        assert!(keys.is_up(HeldKeys::DOWN));
        assert!(!HeldKeys::empty().any_direction());
    }
}
