//! Minimal movement integrator for the headless sim.
//!
//! Flat floor at y = 0, ground friction and acceleration while walking, thin air
//! control and gravity while falling, free flight while noclipping.
//! In Bevy: +X right, +Y up, -Z forward.

use assist::prelude::*;
use bevy::prelude::*;

/// Share of max acceleration available in the air.
pub const AIR_CONTROL: f32 = 0.05;

/// Noclip flight speed, in cm/s.
pub const NOCLIP_SPEED: f32 = 1200.0;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SimPosition(pub Vec3);

pub fn step_character(
    movement: &mut MovementState,
    position: &mut SimPosition,
    ground_friction: f32,
    dt: f32,
) {
    let input = movement.last_input;

    match movement.mode {
        MovementMode::Flying if movement.noclip => {
            let mut wish = input * NOCLIP_SPEED;
            if movement.noclip_vertical_move == NoClipVerticalMove::Up {
                wish.y = NOCLIP_SPEED;
            }
            movement.velocity = wish;
            position.0 += movement.velocity * dt;
            return;
        }
        MovementMode::Walking => {
            let mut horiz = Vec3::new(movement.velocity.x, 0.0, movement.velocity.z);
            horiz *= 1.0 - (ground_friction * dt).min(1.0);

            // Acceleration alone never pushes past max speed; boosted speed bleeds off.
            let limit = movement.max_speed.max(horiz.length());
            horiz += input * movement.max_acceleration * dt;
            horiz = horiz.clamp_length_max(limit);

            movement.velocity.x = horiz.x;
            movement.velocity.z = horiz.z;
        }
        _ => {
            movement.velocity += input * movement.max_acceleration * AIR_CONTROL * dt;
            movement.velocity.y += movement.gravity_y * dt;
        }
    }

    position.0 += movement.velocity * dt;

    // --- Floor ---
    if position.0.y <= 0.0 && movement.velocity.y <= 0.0 {
        position.0.y = 0.0;
        movement.velocity.y = 0.0;
        if movement.mode != MovementMode::Walking {
            movement.land_on(Vec3::Y);
        }
    } else if position.0.y > 0.0 && movement.mode == MovementMode::Walking {
        movement.floor.on_ground = false;
        movement.mode = MovementMode::Falling;
    }
}

pub fn integrate_characters(
    time: Res<Time>,
    mut characters: Query<(&AssistCharacter, &mut MovementState, &mut SimPosition)>,
) {
    let dt = time.delta_secs();
    for (character, mut movement, mut position) in characters.iter_mut() {
        step_character(&mut movement, &mut position, character.ground_friction(), dt);
    }
}
