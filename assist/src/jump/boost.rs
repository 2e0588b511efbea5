//! Forward speed boost on liftoff.
//!
//! A jump adds a share of the forward input speed to the horizontal velocity,
//! clamped so a single jump cannot push past `max_speed * (1 + percent)`. With the
//! bunnyhop toggle on, the unclamped result wins whenever it is faster, which is
//! what lets a perfectly chained run keep gaining speed.

use bevy::prelude::*;

use super::{JumpState, Stance};
use crate::config::{BoostTuning, SimulationConfig};
use crate::facade::{
    clamped_to_max_size_2d, size_2d, size_squared_2d, MovementFacade, NoClipVerticalMove, SMALL_NUMBER,
};

/// Time from liftoff to the top of the arc, computed once at spawn.
///
/// Zero when gravity does not pull down, which leaves boosts unthrottled.
pub fn max_jump_time(jump_velocity: f32, gravity_y: f32) -> f32 {
    if gravity_y >= -SMALL_NUMBER {
        return 0.0;
    }
    -4.0 * jump_velocity / (3.0 * gravity_y)
}

/// Share of forward speed added for the current stance.
pub fn boost_percent(stance: Stance, tuning: &BoostTuning) -> f32 {
    if stance.sprinting || stance.crouching {
        tuning.slowed_boost_percent
    } else {
        tuning.boost_percent
    }
}

/// Inputs to one boost computation.
#[derive(Clone, Copy, Debug)]
pub struct BoostParams {
    pub velocity: Vec3,
    /// Actor forward vector.
    pub facing: Vec3,
    pub last_input: Vec3,
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub stance: Stance,
    pub bunnyhop: bool,
}

/// Proposed post-boost velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostCandidate {
    pub velocity: Vec3,
    /// The overflow clamp was skipped (bunnyhop mode only).
    pub unclamped: bool,
    /// Input speed along the facing direction.
    pub forward_speed: f32,
}

/// What a liftoff did to the velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoostOutcome {
    /// Cheat flying: liftoff switched noclip to rising instead.
    NoClipLift,
    /// Still inside the previous jump's arc.
    Throttled,
    Applied { velocity: Vec3, unclamped: bool },
    /// Candidate was not faster than the current velocity.
    Rejected,
}

/// Pure boost math. Does not check timing or apply anything.
pub fn compute_boost(params: &BoostParams, tuning: &BoostTuning) -> BoostCandidate {
    let input = clamped_to_max_size_2d(params.last_input, 1.0) * params.max_acceleration;
    let forward_speed = input.dot(params.facing);

    let percent = boost_percent(params.stance, tuning);
    let mut speed_addition = (forward_speed * percent).abs();
    let max_boosted_speed = params.max_speed + params.max_speed * percent;
    let new_speed = speed_addition + size_2d(params.velocity);
    let mut speed_addition_no_clamp = speed_addition;

    if new_speed > max_boosted_speed {
        // Already past the cap: no boost rather than a reversed one.
        speed_addition = (speed_addition - (new_speed - max_boosted_speed)).max(0.0);
    }

    // Clearly moving backwards: boost backwards.
    let backward_threshold = -params.max_acceleration * tuning.backward_angle_degrees.to_radians().sin();
    if forward_speed < backward_threshold {
        speed_addition = -speed_addition;
        speed_addition_no_clamp = -speed_addition_no_clamp;
    }

    let mut velocity = params.velocity + params.facing * speed_addition;
    let mut unclamped = false;
    if params.bunnyhop {
        let unclamped_velocity = params.velocity + params.facing * speed_addition_no_clamp;
        if size_squared_2d(unclamped_velocity) > size_squared_2d(velocity) {
            velocity = unclamped_velocity;
            unclamped = true;
        }
    }

    BoostCandidate {
        velocity,
        unclamped,
        forward_speed,
    }
}

/// Liftoff handler. Applies at most one boost per jump arc and never slows the
/// character down. The boost timestamp moves whenever the arc gate passes, even
/// if the candidate is rejected.
pub fn on_jumped(
    jump: &mut JumpState,
    movement: &mut impl MovementFacade,
    facing: Vec3,
    stance: Stance,
    tuning: &BoostTuning,
    config: &SimulationConfig,
    now: f32,
) -> BoostOutcome {
    jump.last_jump_time = Some(now);

    if movement.is_cheat_flying() {
        movement.set_noclip_vertical_move(NoClipVerticalMove::Up);
        return BoostOutcome::NoClipLift;
    }

    if let Some(last) = jump.last_jump_boost_time {
        if now < last + jump.max_jump_time {
            return BoostOutcome::Throttled;
        }
    }
    jump.last_jump_boost_time = Some(now);

    let velocity = movement.velocity();
    let candidate = compute_boost(
        &BoostParams {
            velocity,
            facing,
            last_input: movement.last_input_vector(),
            max_speed: movement.max_speed(),
            max_acceleration: movement.max_acceleration(),
            stance,
            bunnyhop: config.bunnyhop,
        },
        tuning,
    );

    if size_squared_2d(velocity) < size_squared_2d(candidate.velocity) {
        movement.set_velocity(candidate.velocity);
        debug!(
            "jump boost {:.1} -> {:.1} (unclamped: {})",
            size_2d(velocity),
            size_2d(candidate.velocity),
            candidate.unclamped
        );
        BoostOutcome::Applied {
            velocity: candidate.velocity,
            unclamped: candidate.unclamped,
        }
    } else {
        BoostOutcome::Rejected
    }
}
