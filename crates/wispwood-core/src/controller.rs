//! Intent flags and the controllers that compute them.
//!
//! Controllers are the only channel from the outside world (input, distance
//! to the player) into states: they raise and lower [`Intent`] flags once per
//! tick, and states read the flags in `execute`.
//!
//! `DEAD` is sticky. Once set it is never cleared, and `MOVING` can no longer
//! be raised.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::{Body, Facing, StanceHitbox};
use crate::config::Tuning;
use crate::input::{HeldKeys, InputEvent, PointerButton};

bitflags! {
    /// What an entity wants to do this tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Intent: u8 {
        /// Moving under its own power.
        const MOVING = 1;
        /// Just took a hit.
        const HURT = 1 << 1;
        /// Health ran out. Sticky.
        const DEAD = 1 << 2;
        /// Cast key pressed with special available.
        const CASTING = 1 << 3;
        /// Roll button held with special available.
        const ROLLING = 1 << 4;
        /// Attack button pressed.
        const ATTACK = 1 << 5;
    }
}

/// Player hitbox offsets applied while moving left and right.
pub const PLAYER_MOVE_HITBOX: StanceHitbox = StanceHitbox::new(28.0, 24.0, 8.0, 5.0, 8.0);

// =============================================================================
// Shared flag handling
// =============================================================================

/// Flag set with the `DEAD` invariant enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intents(Intent);

impl Intents {
    /// Returns the raw flags.
    #[must_use]
    pub fn bits(self) -> Intent {
        self.0
    }

    /// Returns `true` if `flag` is raised.
    #[must_use]
    pub fn has(self, flag: Intent) -> bool {
        self.0.contains(flag)
    }

    /// Raises or lowers `flag`.
    ///
    /// Lowering `DEAD` and raising `MOVING` are ignored once dead.
    pub fn set(&mut self, flag: Intent, value: bool) {
        let mut flag = flag;
        if self.0.contains(Intent::DEAD) {
            if value {
                flag.remove(Intent::MOVING);
            } else {
                flag.remove(Intent::DEAD);
            }
        }
        self.0.set(flag, value);
    }

    /// Raises `flag`.
    pub fn raise(&mut self, flag: Intent) {
        self.set(flag, true);
    }

    /// Lowers `flag`.
    pub fn lower(&mut self, flag: Intent) {
        self.set(flag, false);
    }

    /// Sets `DEAD` for good and drops `MOVING`.
    pub fn kill(&mut self) {
        self.0.insert(Intent::DEAD);
        self.0.remove(Intent::MOVING);
    }
}

// =============================================================================
// PlayerController
// =============================================================================

/// Turns input into player intents and velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    intents: Intents,
    speed: f32,
    diagonal_divisor: f32,
}

impl PlayerController {
    /// Creates a controller with no intents raised.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            intents: Intents::default(),
            speed: tuning.player_speed,
            diagonal_divisor: tuning.diagonal_divisor,
        }
    }

    /// Returns the current intents.
    #[must_use]
    pub fn intents(&self) -> Intents {
        self.intents
    }

    /// Returns `true` if `flag` is raised.
    #[must_use]
    pub fn has(&self, flag: Intent) -> bool {
        self.intents.has(flag)
    }

    /// Raises or lowers `flag`.
    pub fn set(&mut self, flag: Intent, value: bool) {
        self.intents.set(flag, value);
    }

    /// Marks the player dead.
    pub fn kill(&mut self) {
        self.intents.kill();
    }

    /// Applies a pointer or key edge.
    ///
    /// Roll and cast only register while `special > 0`. Everything is ignored
    /// once dead.
    pub fn apply(&mut self, event: InputEvent, special: u8) {
        if self.intents.has(Intent::DEAD) {
            return;
        }
        match event {
            InputEvent::PointerDown(PointerButton::Primary) => self.intents.raise(Intent::ATTACK),
            InputEvent::PointerUp(PointerButton::Primary) => self.intents.lower(Intent::ATTACK),
            InputEvent::PointerDown(PointerButton::Secondary) => {
                if special > 0 {
                    self.intents.raise(Intent::ROLLING);
                }
            }
            InputEvent::PointerUp(PointerButton::Secondary) => self.intents.lower(Intent::ROLLING),
            InputEvent::CastPressed => {
                if special > 0 {
                    self.intents.raise(Intent::CASTING);
                }
            }
        }
    }

    /// Lowers `CASTING` and `ROLLING` once no special is left to pay for them.
    ///
    /// Both flags are raised only while special is available, but a press can
    /// outlive the count when another state spends it first.
    pub fn settle_special(&mut self, special: u8) {
        if special == 0 {
            self.intents.lower(Intent::CASTING | Intent::ROLLING);
        }
    }

    /// Recomputes `DEAD` and `MOVING` from health and held keys.
    pub fn get_actions(&mut self, health: i32, held: HeldKeys) {
        if health <= 0 {
            self.intents.kill();
        }
        self.intents.set(Intent::MOVING, held.any_direction());
    }

    /// Writes velocity, facing and hitbox from the held keys.
    ///
    /// A straight direction moves at full speed. Each diagonal pair of keys
    /// then gives both axes `speed / diagonal_divisor`, checked in the order
    /// up-left, up-right, down-right, down-left. When opposite keys are held
    /// together, the last matching pair sets the velocity, while facing stays
    /// with the straight-direction winner. Does nothing while dead or paused.
    pub fn movement(&self, held: HeldKeys, body: &mut Body, paused: bool) {
        if paused || self.intents.has(Intent::DEAD) {
            return;
        }

        let left = held.is_down(HeldKeys::LEFT);
        let right = held.is_down(HeldKeys::RIGHT);
        let up = held.is_down(HeldKeys::UP);
        let down = held.is_down(HeldKeys::DOWN);

        if up {
            body.velocity.y = -self.speed;
        } else if down {
            body.velocity.y = self.speed;
        }
        if left {
            body.velocity.x = -self.speed;
            body.facing = Facing::Left;
            body.set_hitbox(PLAYER_MOVE_HITBOX.for_facing(Facing::Left));
        } else if right {
            body.velocity.x = self.speed;
            body.facing = Facing::Right;
            body.set_hitbox(PLAYER_MOVE_HITBOX.for_facing(Facing::Right));
        }

        let diagonal = self.speed / self.diagonal_divisor;
        let pairs = [
            (left && up, Vec2::new(-1.0, -1.0)),
            (right && up, Vec2::new(1.0, -1.0)),
            (right && down, Vec2::new(1.0, 1.0)),
            (left && down, Vec2::new(-1.0, 1.0)),
        ];
        for (active, direction) in pairs {
            if active {
                body.velocity = direction * diagonal;
            }
        }

        if !up && !down {
            body.velocity.y = 0.0;
        }
        if !left && !right {
            body.velocity.x = 0.0;
        }
    }
}

// =============================================================================
// EnemyController
// =============================================================================

/// What an enemy knows about its target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tracking {
    /// Per-axis half extents of the melee box.
    pub melee: Vec2,
    /// Last per-axis absolute distance to the target.
    pub dist: Vec2,
    /// Whether the target is close enough to follow.
    pub follow: bool,
}

impl Tracking {
    /// Creates tracking with the given melee box and no target yet.
    #[must_use]
    pub fn new(melee: Vec2) -> Self {
        Self {
            melee,
            dist: Vec2::splat(f32::INFINITY),
            follow: false,
        }
    }

    /// Returns `true` when both axes are within the melee box.
    #[must_use]
    pub fn in_melee(&self) -> bool {
        self.dist.x <= self.melee.x && self.dist.y <= self.melee.y
    }

    /// Returns `true` when both axes are below `cap`.
    #[must_use]
    pub fn within(&self, cap: f32) -> bool {
        self.dist.x < cap && self.dist.y < cap
    }
}

/// Steers an enemy towards the tracked player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyController {
    intents: Intents,
    speed: f32,
    follow_distance: f32,
    engagement_cap: f32,
}

impl EnemyController {
    /// Creates a controller with no intents raised.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            intents: Intents::default(),
            speed: tuning.enemy_speed,
            follow_distance: tuning.follow_distance,
            engagement_cap: tuning.engagement_cap,
        }
    }

    /// Returns the current intents.
    #[must_use]
    pub fn intents(&self) -> Intents {
        self.intents
    }

    /// Returns `true` if `flag` is raised.
    #[must_use]
    pub fn has(&self, flag: Intent) -> bool {
        self.intents.has(flag)
    }

    /// Raises or lowers `flag`.
    pub fn set(&mut self, flag: Intent, value: bool) {
        self.intents.set(flag, value);
    }

    /// Marks the enemy dead.
    pub fn kill(&mut self) {
        self.intents.kill();
    }

    /// Measures the distance to `target` and decides whether to chase it.
    ///
    /// The enemy steers to `target` lifted by `aim_lift` on y so that sprite
    /// centres line up. Facing follows the x velocity.
    pub fn get_actions(&mut self, body: &mut Body, tracking: &mut Tracking, target: Vec2, aim_lift: f32) {
        if self.intents.has(Intent::DEAD) {
            return;
        }

        tracking.dist = (target - body.position).abs();
        tracking.follow =
            tracking.dist.x < self.follow_distance || tracking.dist.y < self.follow_distance;

        if tracking.follow && !tracking.in_melee() && tracking.within(self.engagement_cap) {
            body.move_towards(Vec2::new(target.x, target.y - aim_lift), self.speed);
            self.intents.raise(Intent::MOVING);
        } else {
            body.stop();
            self.intents.lower(Intent::MOVING);
        }
        body.face_by_velocity();
    }
}
