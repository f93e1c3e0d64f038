//! Physical body state shared with the external physics layer.
//!
//! The core never integrates motion. It writes velocities, facing and hitbox
//! requests; the host's physics layer reads them, resolves collisions and
//! writes positions back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal facing of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Facing +x (sprite not flipped).
    #[default]
    Right,
    /// Facing -x (sprite flipped).
    Left,
}

impl Facing {
    /// Returns the other facing.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }

    /// Returns `1.0` for right, `-1.0` for left.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Right => 1.0,
            Self::Left => -1.0,
        }
    }
}

/// Collision box size and offset relative to the sprite origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hitbox {
    /// Width and height.
    pub size: Vec2,
    /// Offset from the sprite's top-left corner.
    pub offset: Vec2,
}

impl Hitbox {
    /// Creates a hitbox from width, height and offset.
    #[must_use]
    pub const fn new(width: f32, height: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::new(offset_x, offset_y),
        }
    }
}

/// A hitbox whose x offset depends on facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceHitbox {
    /// Width and height.
    pub size: Vec2,
    /// X offset while facing left.
    pub left_x: f32,
    /// X offset while facing right.
    pub right_x: f32,
    /// Y offset.
    pub offset_y: f32,
}

impl StanceHitbox {
    /// Creates a facing-dependent hitbox.
    #[must_use]
    pub const fn new(width: f32, height: f32, left_x: f32, right_x: f32, offset_y: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            left_x,
            right_x,
            offset_y,
        }
    }

    /// Resolves the hitbox for a facing.
    #[must_use]
    pub fn for_facing(&self, facing: Facing) -> Hitbox {
        let x = match facing {
            Facing::Left => self.left_x,
            Facing::Right => self.right_x,
        };
        Hitbox {
            size: self.size,
            offset: Vec2::new(x, self.offset_y),
        }
    }
}

/// Position, velocity, facing and hitbox of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World position (written by the host's physics layer).
    pub position: Vec2,
    /// Requested velocity in units per second.
    pub velocity: Vec2,
    /// Horizontal facing.
    pub facing: Facing,
    /// Current collision box.
    pub hitbox: Hitbox,
    /// Whether the renderer should draw the entity.
    pub visible: bool,
}

impl Body {
    /// Creates a visible, motionless body facing right.
    #[must_use]
    pub fn new(position: Vec2, hitbox: Hitbox) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            hitbox,
            visible: true,
        }
    }

    /// Zeroes the velocity.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Replaces the collision box.
    pub fn set_hitbox(&mut self, hitbox: Hitbox) {
        self.hitbox = hitbox;
    }

    /// Points the velocity at `target` with magnitude `speed`.
    ///
    /// Stops when already at the target.
    pub fn move_towards(&mut self, target: Vec2, speed: f32) {
        self.velocity = (target - self.position).normalize_or_zero() * speed;
    }

    /// Turns the sprite to match the sign of the x velocity.
    ///
    /// A zero x velocity keeps the current facing.
    pub fn face_by_velocity(&mut self) {
        if self.velocity.x < 0.0 {
            self.facing = Facing::Left;
        } else if self.velocity.x > 0.0 {
            self.facing = Facing::Right;
        }
    }
}
