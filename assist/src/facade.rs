//! Contract with the external movement integrator.
//!
//! The assist layer never integrates positions itself. Everything it reads from or
//! writes to the integrator goes through [`MovementFacade`]. [`MovementState`] is a
//! plain data implementation of that contract; the headless sim drives it with its
//! own integrator and the tests use it directly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Magnitudes at or below this are treated as zero (masses, divisors).
pub const SMALL_NUMBER: f32 = 1.0e-8;

/// Tolerance for "nearly" comparisons on unit-scale values (axis samples, floor cosines).
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Movement mode reported by the integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    #[default]
    Walking,
    Falling,
    Flying,
    Swimming,
}

impl MovementMode {
    pub fn is_moving_on_ground(self) -> bool {
        self == MovementMode::Walking
    }

    pub fn is_falling(self) -> bool {
        self == MovementMode::Falling
    }
}

/// Vertical sub-mode used while noclipping with the jump key held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoClipVerticalMove {
    #[default]
    None,
    Up,
}

/// Result of the integrator's last floor sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorContact {
    pub on_ground: bool,
    /// Surface normal at the impact point (unit length).
    pub impact_normal: Vec3,
}

impl Default for FloorContact {
    fn default() -> Self {
        Self {
            on_ground: true,
            impact_normal: Vec3::Y,
        }
    }
}

impl FloorContact {
    /// Vertical component of the impact normal (cosine of the floor slope).
    pub fn floor_z(&self) -> f32 {
        Vec3::Y.dot(self.impact_normal)
    }
}

/// Everything the assist layer needs from a movement integrator.
///
/// Implementations own the velocity and floor data. World time is not part of
/// the contract; callers pass the current simulation time explicitly.
pub trait MovementFacade {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn max_speed(&self) -> f32;
    fn max_acceleration(&self) -> f32;
    /// Movement input latched for the current step.
    fn last_input_vector(&self) -> Vec3;
    fn mass(&self) -> f32;
    fn floor(&self) -> FloorContact;
    /// Minimum floor normal `y` that still counts as walkable.
    fn walkable_floor_z(&self) -> f32;
    fn movement_mode(&self) -> MovementMode;
    fn is_cheat_flying(&self) -> bool;
    /// Signed gravity along `y` (negative pulls down).
    fn gravity_y(&self) -> f32;
    /// Vertical launch speed used by [`MovementFacade::do_jump`].
    fn jump_velocity(&self) -> f32;
    /// `false` while the integrator refuses jumps (e.g. mid forced landing).
    fn is_jump_allowed(&self) -> bool;

    /// Apply an instantaneous impulse. Mass-dependent impulses are divided by mass.
    fn add_impulse(&mut self, impulse: Vec3, mass_independent: bool);
    /// Accumulate world-space movement input for the next integration step.
    fn add_input_vector(&mut self, input: Vec3);
    fn set_noclip_vertical_move(&mut self, mode: NoClipVerticalMove);
    fn toggle_noclip(&mut self);
    /// Launch the character. Returns `false` if the integrator declined.
    fn do_jump(&mut self) -> bool;

    fn is_moving_on_ground(&self) -> bool {
        self.movement_mode().is_moving_on_ground()
    }

    fn is_falling(&self) -> bool {
        self.movement_mode().is_falling()
    }
}

/// Length of `v` in the horizontal (`xz`) plane.
#[inline]
pub fn size_2d(v: Vec3) -> f32 {
    size_squared_2d(v).sqrt()
}

/// Squared length of `v` in the horizontal (`xz`) plane.
#[inline]
pub fn size_squared_2d(v: Vec3) -> f32 {
    v.x * v.x + v.z * v.z
}

/// Clamp the horizontal part of `v` to `max`, keeping the vertical part.
pub fn clamped_to_max_size_2d(v: Vec3, max: f32) -> Vec3 {
    if max < KINDA_SMALL_NUMBER {
        return Vec3::new(0.0, v.y, 0.0);
    }
    let size_sq = size_squared_2d(v);
    if size_sq > max * max {
        let scale = max / size_sq.sqrt();
        Vec3::new(v.x * scale, v.y, v.z * scale)
    } else {
        v
    }
}

/// Plain movement state owned by the host.
///
/// Units follow the reference tuning: centimetres, cm/s, cm/s², kilograms.
#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    pub velocity: Vec3,
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub mass: f32,
    pub floor: FloorContact,
    pub walkable_floor_z: f32,
    pub mode: MovementMode,
    pub cheat_flying: bool,
    pub noclip: bool,
    pub noclip_vertical_move: NoClipVerticalMove,
    pub gravity_y: f32,
    pub jump_velocity: f32,
    pub jump_allowed: bool,
    /// Input accumulated this tick, latched into `last_input` before the jump check.
    pub pending_input: Vec3,
    pub last_input: Vec3,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            max_speed: 900.0,
            max_acceleration: 2000.0,
            mass: 100.0,
            floor: FloorContact::default(),
            // ~45 degrees
            walkable_floor_z: 0.71,
            mode: MovementMode::Walking,
            cheat_flying: false,
            noclip: false,
            noclip_vertical_move: NoClipVerticalMove::None,
            gravity_y: -980.0,
            jump_velocity: 420.0,
            jump_allowed: true,
            pending_input: Vec3::ZERO,
            last_input: Vec3::ZERO,
        }
    }
}

impl MovementState {
    /// Move the accumulated input into `last_input` (clamped to unit length) and return it.
    pub fn consume_input_vector(&mut self) -> Vec3 {
        self.last_input = self.pending_input.clamp_length_max(1.0);
        self.pending_input = Vec3::ZERO;
        self.last_input
    }

    /// Put the character on a floor with the given normal and switch to walking.
    pub fn land_on(&mut self, impact_normal: Vec3) {
        self.floor = FloorContact {
            on_ground: true,
            impact_normal,
        };
        self.mode = MovementMode::Walking;
    }
}

impl MovementFacade for MovementState {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn max_speed(&self) -> f32 {
        self.max_speed
    }

    fn max_acceleration(&self) -> f32 {
        self.max_acceleration
    }

    fn last_input_vector(&self) -> Vec3 {
        self.last_input
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn floor(&self) -> FloorContact {
        self.floor
    }

    fn walkable_floor_z(&self) -> f32 {
        self.walkable_floor_z
    }

    fn movement_mode(&self) -> MovementMode {
        self.mode
    }

    fn is_cheat_flying(&self) -> bool {
        self.cheat_flying
    }

    fn gravity_y(&self) -> f32 {
        self.gravity_y
    }

    fn jump_velocity(&self) -> f32 {
        self.jump_velocity
    }

    fn is_jump_allowed(&self) -> bool {
        self.jump_allowed
    }

    fn add_impulse(&mut self, impulse: Vec3, mass_independent: bool) {
        if !mass_independent && self.mass > SMALL_NUMBER {
            self.velocity += impulse / self.mass;
        } else {
            self.velocity += impulse;
        }
    }

    fn add_input_vector(&mut self, input: Vec3) {
        self.pending_input += input;
    }

    fn set_noclip_vertical_move(&mut self, mode: NoClipVerticalMove) {
        self.noclip_vertical_move = mode;
    }

    fn toggle_noclip(&mut self) {
        self.noclip = !self.noclip;
        self.cheat_flying = self.noclip;
        self.mode = if self.noclip {
            MovementMode::Flying
        } else {
            MovementMode::Falling
        };
        self.noclip_vertical_move = NoClipVerticalMove::None;
    }

    fn do_jump(&mut self) -> bool {
        if !self.jump_allowed {
            return false;
        }
        if self.cheat_flying {
            // Noclip rises through the vertical move flag instead.
            return true;
        }
        self.velocity.y = self.velocity.y.max(self.jump_velocity);
        self.floor.on_ground = false;
        self.mode = MovementMode::Falling;
        true
    }
}
