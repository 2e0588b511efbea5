//! Jump eligibility and jump-input bookkeeping.
//!
//! One input check per tick: [`press`] when the key goes down, [`check_jump_input`]
//! before the integrator runs, [`clear_jump_input`] after it, and
//! [`on_movement_mode_changed`] whenever the integrator switches mode.

use bevy::prelude::*;

use super::{JumpPhase, JumpState, Liftoff, MovementModeTransition};
use crate::config::SimulationConfig;
use crate::facade::{MovementFacade, MovementMode, NoClipVerticalMove, KINDA_SMALL_NUMBER};

/// Why a jump request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpDenial {
    /// The integrator does not allow jumping right now.
    NotAllowed,
    /// No jumps left before landing.
    CountExhausted,
    /// The jump key is up, or has been held past the hold budget.
    HoldExpired,
    /// Standing on a floor steeper than the walkable limit.
    FloorTooSteep,
}

/// Full eligibility check with the reason for a refusal.
pub fn evaluate(jump: &JumpState, movement: &impl MovementFacade) -> Result<(), JumpDenial> {
    if !movement.is_jump_allowed() {
        return Err(JumpDenial::NotAllowed);
    }

    if !jump.was_jumping || jump.max_hold_time <= 0.0 {
        // A first jump that starts while already falling needs room for one more.
        let has_room = if jump.current_count == 0 && movement.is_falling() {
            jump.current_count + 1 < jump.max_count
        } else {
            jump.current_count < jump.max_count
        };
        if !has_room {
            return Err(JumpDenial::CountExhausted);
        }
    } else {
        // Hold time only matters on the ground, while jumps remain, or when the
        // final jump of the chain is still being held.
        let key_held = jump.pressed && jump.key_hold_time < jump.max_hold_time;
        if !key_held {
            return Err(JumpDenial::HoldExpired);
        }
        let chain_open = movement.is_moving_on_ground()
            || jump.current_count < jump.max_count
            || (jump.was_jumping && jump.current_count == jump.max_count);
        if !chain_open {
            return Err(JumpDenial::CountExhausted);
        }
    }

    if movement.is_moving_on_ground() {
        let floor_z = movement.floor().floor_z();
        if !is_walkable(floor_z, movement.walkable_floor_z()) {
            return Err(JumpDenial::FloorTooSteep);
        }
    }

    Ok(())
}

/// Whether a jump request may be honored this tick.
pub fn can_jump(jump: &JumpState, movement: &impl MovementFacade) -> bool {
    evaluate(jump, movement).is_ok()
}

/// Floor slope gate. Exactly-at-threshold floors pass.
pub fn is_walkable(floor_z: f32, walkable_floor_z: f32) -> bool {
    floor_z >= walkable_floor_z || (floor_z - walkable_floor_z).abs() <= KINDA_SMALL_NUMBER
}

/// Jump key went down.
pub fn press(jump: &mut JumpState) {
    jump.pressed = true;
    jump.key_hold_time = 0.0;
    jump.phase = JumpPhase::JumpPending;
}

/// Jump key released.
pub fn stop_jumping(jump: &mut JumpState, movement: &mut impl MovementFacade) {
    jump.reset(movement.is_falling());
    jump.phase = JumpPhase::settled(movement.movement_mode());
    if movement.is_cheat_flying() {
        movement.set_noclip_vertical_move(NoClipVerticalMove::None);
    }
}

/// Run the gate against a pressed key and launch through the integrator.
///
/// Returns the liftoff only on the transition into jumping; holding through a
/// multi-jump sequence keeps `was_jumping` set without reporting new liftoffs.
pub fn check_jump_input(jump: &mut JumpState, movement: &mut impl MovementFacade, now: f32) -> Option<Liftoff> {
    if !jump.pressed {
        return None;
    }

    // Walking off a ledge already spent the first jump.
    if jump.current_count == 0 && movement.is_falling() {
        jump.current_count += 1;
    }

    let verdict = evaluate(jump, movement);
    let did_jump = verdict.is_ok() && movement.do_jump();

    let mut liftoff = None;
    if did_jump && !jump.was_jumping {
        jump.current_count += 1;
        jump.force_time_remaining = jump.max_hold_time;
        liftoff = Some(Liftoff {
            time: now,
            count: jump.current_count,
        });
    }
    jump.was_jumping = did_jump;

    jump.phase = if did_jump {
        JumpPhase::JumpApproved
    } else {
        if let Err(reason) = verdict {
            trace!("jump denied: {:?}", reason);
        }
        JumpPhase::JumpDenied
    };

    liftoff
}

/// End-of-tick hold-time accounting.
///
/// Skipped entirely while auto-hopping or cheat flying so the key stays pressed
/// and the character keeps jumping (or rising) on its own.
pub fn clear_jump_input(
    jump: &mut JumpState,
    movement: &impl MovementFacade,
    auto_bunnyhop: bool,
    config: &SimulationConfig,
    dt: f32,
) {
    if config.auto_hop || auto_bunnyhop || movement.is_cheat_flying() {
        return;
    }

    if jump.pressed {
        jump.key_hold_time += dt;
        if jump.key_hold_time >= jump.max_hold_time {
            jump.pressed = false;
        }
    } else {
        jump.force_time_remaining = 0.0;
        jump.was_jumping = false;
    }

    if !jump.pressed {
        jump.phase = JumpPhase::settled(movement.movement_mode());
    }
}

/// Update jump state for a movement mode switch. The returned transition is
/// only produced after the reset so observers see the new state.
pub fn on_movement_mode_changed(
    jump: &mut JumpState,
    movement: &impl MovementFacade,
    previous: MovementMode,
    now: f32,
) -> MovementModeTransition {
    if !jump.pressed {
        jump.reset(movement.is_falling());
    }

    if movement.is_falling() {
        // Lets proxies expire the jump force without ticking a timer.
        if jump.proxy_jump_force_applied {
            jump.proxy_jump_force_started_time = Some(now);
        }
    } else {
        jump.current_count = 0;
        jump.key_hold_time = 0.0;
        jump.force_time_remaining = 0.0;
        jump.was_jumping = false;
    }

    if !jump.pressed {
        jump.phase = JumpPhase::settled(movement.movement_mode());
    }

    MovementModeTransition {
        previous,
        current: movement.movement_mode(),
    }
}
