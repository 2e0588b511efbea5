//! Look and move input mapping.
//!
//! Raw axis samples come in, world-space directions and clamped look deltas go out.
//! In Bevy: +X is right, +Y is up, -Z is forward. Angles are in degrees to match
//! the camera settings.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::facade::KINDA_SMALL_NUMBER;

/// Per-character camera tuning. Fixed after spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Yaw sensitivity. Lower is slower.
    pub sensitivity_x: f32,
    /// Pitch sensitivity. Lower is slower.
    pub sensitivity_y: f32,
    /// Minimum view pitch in degrees (e.g. -90, 300, 270).
    pub min_pitch: f32,
    /// Maximum view pitch in degrees (e.g. 20, 45, 90).
    pub max_pitch: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            sensitivity_x: 50.0,
            sensitivity_y: 50.0,
            min_pitch: -90.0,
            max_pitch: 90.0,
        }
    }
}

/// Pitch limiter handed to the camera, built once from [`CameraSettings`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewLimits {
    min_pitch: f32,
    max_pitch: f32,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self::from_camera(&CameraSettings::default())
    }
}

impl ViewLimits {
    pub fn from_camera(camera: &CameraSettings) -> Self {
        let defaults = CameraSettings::default();
        let min = finite_or(camera.min_pitch, defaults.min_pitch);
        let max = finite_or(camera.max_pitch, defaults.max_pitch);
        let (min, max) = (normalize_axis(min), normalize_axis(max));
        Self {
            min_pitch: min.min(max),
            max_pitch: min.max(max),
        }
    }

    pub fn min_pitch(&self) -> f32 {
        self.min_pitch
    }

    pub fn max_pitch(&self) -> f32 {
        self.max_pitch
    }

    /// Clamp a pitch (any winding) into `[min_pitch, max_pitch]`.
    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        normalize_axis(finite_or(pitch, 0.0)).clamp(self.min_pitch, self.max_pitch)
    }
}

/// Controller look rotation in degrees.
///
/// Positive pitch looks up, positive yaw turns counter-clockwise seen from above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlRotation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl ControlRotation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch,
            roll: 0.0,
        }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    pub fn forward(self) -> Vec3 {
        self.to_quat() * Vec3::NEG_Z
    }

    pub fn right(self) -> Vec3 {
        self.to_quat() * Vec3::X
    }

    /// Same rotation with pitch zeroed.
    pub fn without_pitch(self) -> Self {
        Self { pitch: 0.0, ..self }
    }

    /// Add look deltas, then clamp pitch through the camera limiter.
    pub fn apply_look(&mut self, yaw_delta: f32, pitch_delta: f32, limits: &ViewLimits) {
        self.yaw = normalize_axis(self.yaw + yaw_delta);
        self.pitch = limits.clamp_pitch(self.pitch + pitch_delta);
    }
}

/// Scale raw look samples by sensitivity and frame time.
///
/// Returns `(yaw_delta, pitch_delta)`; frame-rate independent.
pub fn map_look(camera: &CameraSettings, raw_yaw: f32, raw_pitch: f32, elapsed_seconds: f32) -> (f32, f32) {
    (
        sanitize_axis(raw_yaw) * camera.sensitivity_x * elapsed_seconds,
        sanitize_axis(raw_pitch) * camera.sensitivity_y * elapsed_seconds,
    )
}

/// Contribution of one move axis. Dead-zone jitter contributes nothing.
pub fn map_move(basis: Vec3, axis_value: f32) -> Vec3 {
    let axis_value = sanitize_axis(axis_value);
    if axis_value.abs() <= KINDA_SMALL_NUMBER {
        Vec3::ZERO
    } else {
        basis * axis_value
    }
}

/// Forward basis for movement. On the ground or falling the pitch is dropped so
/// forward/back stays horizontal; other modes keep the full look rotation.
pub fn resolve_forward_direction(control_rotation: ControlRotation, grounded_or_falling: bool) -> Vec3 {
    let rotation = if grounded_or_falling {
        control_rotation.without_pitch()
    } else {
        control_rotation
    };
    rotation.forward()
}

/// Right basis for strafing, from the unmodified look rotation.
pub fn resolve_right_direction(control_rotation: ControlRotation) -> Vec3 {
    control_rotation.right()
}

/// Wrap an angle into `(-180, 180]`.
pub fn normalize_axis(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn sanitize_axis(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        bevy::log::warn_once!("dropping non-finite input axis sample {value}");
        0.0
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_look_scales_with_frame_time() {
        let camera = CameraSettings::default();
        let (yaw, pitch) = map_look(&camera, 1.0, -0.5, 0.02);
        assert!((yaw - 1.0).abs() < 1e-5);
        assert!((pitch + 0.5).abs() < 1e-5);

        // Two half-length frames add up to one full frame.
        let (half_yaw, _) = map_look(&camera, 1.0, 0.0, 0.01);
        assert!((half_yaw * 2.0 - yaw).abs() < 1e-5);
    }

    #[test]
    fn test_move_dead_zone() {
        assert_eq!(map_move(Vec3::NEG_Z, 0.00001), Vec3::ZERO);
        assert_eq!(map_move(Vec3::NEG_Z, 0.5), Vec3::new(0.0, 0.0, -0.5));
    }

    #[test]
    fn test_non_finite_axis_is_dropped() {
        assert_eq!(map_move(Vec3::X, f32::NAN), Vec3::ZERO);
        let (yaw, pitch) = map_look(&CameraSettings::default(), f32::INFINITY, 1.0, 0.1);
        assert_eq!(yaw, 0.0);
        assert!((pitch - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_forward_stays_horizontal_when_grounded() {
        let looking_down = ControlRotation::new(0.0, -60.0);
        let forward = resolve_forward_direction(looking_down, true);
        assert!(approx(forward, Vec3::NEG_Z));

        let flying = resolve_forward_direction(looking_down, false);
        assert!(flying.y < -0.8);
    }

    #[test]
    fn test_right_uses_full_rotation() {
        let rotation = ControlRotation::new(90.0, 30.0);
        let right = resolve_right_direction(rotation);
        // Yawed 90 degrees left, right points down -Z; pitch never tilts it.
        assert!(approx(right, Vec3::NEG_Z));
        assert!(approx(rotation.without_pitch().forward(), Vec3::NEG_X));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let limits = ViewLimits::from_camera(&CameraSettings {
            min_pitch: -45.0,
            max_pitch: 30.0,
            ..default()
        });
        let mut rotation = ControlRotation::default();
        rotation.apply_look(0.0, 80.0, &limits);
        assert_eq!(rotation.pitch, 30.0);
        rotation.apply_look(0.0, -200.0, &limits);
        assert_eq!(rotation.pitch, -45.0);
    }

    #[test]
    fn test_wrapped_pitch_limits() {
        // 300 degrees is the same as -60.
        let limits = ViewLimits::from_camera(&CameraSettings {
            min_pitch: 300.0,
            max_pitch: 20.0,
            ..default()
        });
        assert_eq!(limits.min_pitch(), -60.0);
        assert_eq!(limits.clamp_pitch(-80.0), -60.0);
        assert_eq!(limits.clamp_pitch(350.0), -10.0);
    }
}
