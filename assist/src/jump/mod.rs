//! Jump bookkeeping shared by the gate and the booster.
//!
//! [`JumpState`] is owned by the character. [`gate`] decides whether a jump request
//! is honored and keeps the count/hold-time books; [`boost`] adds forward speed on
//! liftoff.

pub mod boost;
pub mod gate;

use serde::{Deserialize, Serialize};

use crate::config::JumpTuning;
use crate::facade::MovementMode;

/// Where the character is in the jump cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpPhase {
    #[default]
    Grounded,
    Airborne,
    /// Jump key pressed, not yet evaluated.
    JumpPending,
    JumpApproved,
    JumpDenied,
}

impl JumpPhase {
    /// Resting phase for a movement mode.
    pub fn settled(mode: MovementMode) -> Self {
        if mode.is_moving_on_ground() {
            JumpPhase::Grounded
        } else {
            JumpPhase::Airborne
        }
    }
}

/// Stance flags that shrink the jump boost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stance {
    pub sprinting: bool,
    pub crouching: bool,
}

/// Jump counters, timers and timestamps for one character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    pub phase: JumpPhase,
    /// Jump key currently counts as pressed.
    pub pressed: bool,
    pub current_count: u32,
    pub max_count: u32,
    /// Seconds the jump key has been held in this sequence.
    pub key_hold_time: f32,
    pub max_hold_time: f32,
    /// A jump was performed on the previous input check.
    pub was_jumping: bool,
    pub force_time_remaining: f32,
    /// Set by replication when a jump force is running on a non-authoritative copy.
    pub proxy_jump_force_applied: bool,
    pub proxy_jump_force_started_time: Option<f32>,
    pub last_jump_time: Option<f32>,
    pub last_jump_boost_time: Option<f32>,
    /// Time to the top of the jump arc, fixed at spawn.
    pub max_jump_time: f32,
}

impl JumpState {
    pub fn new(tuning: &JumpTuning, max_jump_time: f32) -> Self {
        Self {
            phase: JumpPhase::Grounded,
            pressed: false,
            current_count: 0,
            max_count: tuning.max_count.max(1),
            key_hold_time: 0.0,
            max_hold_time: tuning.max_hold_time,
            was_jumping: false,
            force_time_remaining: 0.0,
            proxy_jump_force_applied: false,
            proxy_jump_force_started_time: None,
            last_jump_time: None,
            last_jump_boost_time: None,
            max_jump_time,
        }
    }

    /// Clear the press and timers. The count survives while falling so a second
    /// press mid-air still spends from the same budget.
    pub fn reset(&mut self, falling: bool) {
        self.pressed = false;
        self.was_jumping = false;
        self.key_hold_time = 0.0;
        self.force_time_remaining = 0.0;
        if !falling {
            self.current_count = 0;
        }
    }
}

/// A jump that actually left the ground this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Liftoff {
    pub time: f32,
    /// Jump count after this liftoff.
    pub count: u32,
}

/// Movement mode change, reported after the jump state has been updated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementModeTransition {
    pub previous: MovementMode,
    pub current: MovementMode,
}
