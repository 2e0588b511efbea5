//! Damage knockback.
//!
//! Turns a damage event into an impulse scaled by how big the character's capsule
//! is relative to a reference humanoid, caps the upward launch, and hands the
//! result to the integrator.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ImpulseTuning;
use crate::facade::{clamped_to_max_size_2d, size_squared_2d, MovementFacade, SMALL_NUMBER};

/// Collision capsule size (scaled), in centimetres.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    pub radius: f32,
    pub half_height: f32,
}

impl Default for CapsuleShape {
    fn default() -> Self {
        let reference = ImpulseTuning::default();
        Self {
            radius: reference.reference_radius,
            half_height: reference.reference_half_height,
        }
    }
}

/// One incoming damage event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageImpulseRequest {
    pub damage: f32,
    /// Push direction derived from the hit (unit length).
    pub direction: Vec3,
    pub contact_point: Vec3,
    /// Divide by the character's mass before applying.
    pub scale_by_mass: bool,
}

/// Resolved knockback for one damage event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedImpulse {
    /// Impulse handed to the integrator.
    pub impulse: Vec3,
    pub mass_independent: bool,
    /// Velocity change the integrator will apply.
    pub velocity_delta: Vec3,
}

/// Knockback scale for a capsule: 1.0 at the reference size, larger for smaller
/// characters. Degenerate capsules use 1.0.
pub fn size_factor(capsule: &CapsuleShape, tuning: &ImpulseTuning) -> f32 {
    let diameter = capsule.radius * 2.0;
    let volume = diameter * diameter * capsule.half_height * 2.0;
    if !volume.is_finite() || volume <= SMALL_NUMBER {
        return 1.0;
    }
    tuning.reference_volume() / volume
}

pub fn compute_impulse(
    request: &DamageImpulseRequest,
    capsule: &CapsuleShape,
    mass: f32,
    tuning: &ImpulseTuning,
) -> ResolvedImpulse {
    let mut impulse = request.direction * request.damage * size_factor(capsule, tuning) * tuning.impulse_scale;

    let mass_independent = !request.scale_by_mass;
    let divide_by_mass = !mass_independent && mass > SMALL_NUMBER;
    let mass_scaled = if divide_by_mass { impulse / mass } else { impulse };

    if mass_scaled.y > tuning.max_upward {
        impulse.y = tuning.max_upward;
    }

    if tuning.clamp_horizontal && size_squared_2d(mass_scaled) > tuning.max_horizontal * tuning.max_horizontal {
        impulse = clamped_to_max_size_2d(impulse, tuning.max_horizontal);
    }

    let mut velocity_delta = if divide_by_mass { impulse / mass } else { impulse };

    // Light characters (mass below 1) would still launch past the cap.
    if velocity_delta.y > tuning.max_upward {
        velocity_delta.y = tuning.max_upward;
        impulse.y = if divide_by_mass { tuning.max_upward * mass } else { tuning.max_upward };
    }

    ResolvedImpulse {
        impulse,
        mass_independent,
        velocity_delta,
    }
}

/// Resolve a damage event and push the character. Multiple events in one tick
/// accumulate in the order they are applied.
pub fn apply_damage_momentum(
    request: &DamageImpulseRequest,
    capsule: &CapsuleShape,
    movement: &mut impl MovementFacade,
    tuning: &ImpulseTuning,
) -> ResolvedImpulse {
    let resolved = compute_impulse(request, capsule, movement.mass(), tuning);
    movement.add_impulse(resolved.impulse, resolved.mass_independent);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::MovementState;

    fn request(damage: f32, direction: Vec3, scale_by_mass: bool) -> DamageImpulseRequest {
        DamageImpulseRequest {
            damage,
            direction,
            contact_point: Vec3::ZERO,
            scale_by_mass,
        }
    }

    #[test]
    fn test_reference_capsule_has_unit_size_factor() {
        let factor = size_factor(&CapsuleShape::default(), &ImpulseTuning::default());
        assert!((factor - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_reference_capsule_upward_hit() {
        let resolved = compute_impulse(
            &request(50.0, Vec3::Y, false),
            &CapsuleShape::default(),
            100.0,
            &ImpulseTuning::default(),
        );
        assert!((resolved.impulse.y - 50.0 * 3.75).abs() < 1e-2);
        assert!(resolved.mass_independent);
        assert_eq!(resolved.velocity_delta, resolved.impulse);
    }

    #[test]
    fn test_smaller_capsule_gets_more_knockback() {
        let small = CapsuleShape {
            radius: 15.24,
            half_height: 68.58,
        };
        let factor = size_factor(&small, &ImpulseTuning::default());
        assert!((factor - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_small_humanoid_capsule_factor() {
        // An 18 cm radius, 44 cm half-height capsule is far below the reference size.
        let capsule = CapsuleShape {
            radius: 18.0,
            half_height: 44.0,
        };
        let factor = size_factor(&capsule, &ImpulseTuning::default());
        assert!((factor - 4.469).abs() < 1e-2);

        let resolved = compute_impulse(&request(50.0, Vec3::Y, false), &capsule, 100.0, &ImpulseTuning::default());
        assert!((resolved.impulse.y - 50.0 * factor * 3.75).abs() < 1e-2);
    }

    #[test]
    fn test_degenerate_capsule_uses_unit_factor() {
        let flat = CapsuleShape {
            radius: 0.0,
            half_height: 10.0,
        };
        assert_eq!(size_factor(&flat, &ImpulseTuning::default()), 1.0);
    }

    #[test]
    fn test_upward_launch_is_capped() {
        let tuning = ImpulseTuning::default();
        for damage in [10.0, 400.0, 5000.0, 1.0e6] {
            let resolved = compute_impulse(&request(damage, Vec3::Y, false), &CapsuleShape::default(), 100.0, &tuning);
            assert!(resolved.velocity_delta.y <= tuning.max_upward + 1e-3);

            let scaled = compute_impulse(&request(damage, Vec3::Y, true), &CapsuleShape::default(), 100.0, &tuning);
            assert!(scaled.velocity_delta.y <= tuning.max_upward + 1e-3);

            for mass in [0.001, 0.1, 0.5, 0.99] {
                let light = compute_impulse(&request(damage, Vec3::Y, true), &CapsuleShape::default(), mass, &tuning);
                assert!(light.velocity_delta.y <= tuning.max_upward + 1e-3, "mass {mass}, damage {damage}");
                assert!((light.impulse.y / mass - light.velocity_delta.y).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn test_half_mass_launch_lands_on_cap() {
        let tuning = ImpulseTuning::default();
        let mut state = MovementState {
            mass: 0.5,
            ..default()
        };
        let resolved = apply_damage_momentum(
            &request(266.67, Vec3::Y, true),
            &CapsuleShape::default(),
            &mut state,
            &tuning,
        );
        assert!((resolved.velocity_delta.y - tuning.max_upward).abs() < 1e-2);
        assert!((state.velocity.y - tuning.max_upward).abs() < 1e-2);
    }

    #[test]
    fn test_mass_scaling_divides_velocity_delta() {
        let resolved = compute_impulse(
            &request(100.0, Vec3::X, true),
            &CapsuleShape::default(),
            50.0,
            &ImpulseTuning::default(),
        );
        assert!(!resolved.mass_independent);
        assert!((resolved.impulse.x - 375.0).abs() < 1e-2);
        assert!((resolved.velocity_delta.x - 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_zero_mass_with_scaling_stays_finite() {
        let resolved = compute_impulse(
            &request(100.0, Vec3::X, true),
            &CapsuleShape::default(),
            0.0,
            &ImpulseTuning::default(),
        );
        assert!(resolved.velocity_delta.is_finite());
        assert_eq!(resolved.velocity_delta, resolved.impulse);
    }

    #[test]
    fn test_horizontal_clamp_is_inert_by_default() {
        let resolved = compute_impulse(
            &request(1000.0, Vec3::X, false),
            &CapsuleShape::default(),
            100.0,
            &ImpulseTuning::default(),
        );
        assert!((resolved.impulse.x - 3750.0).abs() < 1e-1);

        let tuning = ImpulseTuning {
            clamp_horizontal: true,
            ..default()
        };
        let clamped = compute_impulse(&request(1000.0, Vec3::X, false), &CapsuleShape::default(), 100.0, &tuning);
        assert!((clamped.impulse.x - tuning.max_horizontal).abs() < 1e-1);
    }

    #[test]
    fn test_events_accumulate_in_order() {
        let mut state = MovementState::default();
        let capsule = CapsuleShape::default();
        let tuning = ImpulseTuning::default();
        apply_damage_momentum(&request(10.0, Vec3::X, false), &capsule, &mut state, &tuning);
        apply_damage_momentum(&request(10.0, Vec3::NEG_Z, false), &capsule, &mut state, &tuning);
        assert!((state.velocity - Vec3::new(37.5, 0.0, -37.5)).length() < 1e-3);
    }
}
