//! Tuning and runtime toggles.
//!
//! [`AssistConfig`] is the per-character tuning loaded at spawn (RON on disk).
//! [`SimulationConfig`] holds the process-wide console toggles; systems read it
//! fresh every tick so console changes apply on the next step.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::input::CameraSettings;

/// Console variable: keep jumping while the jump key is held.
pub const CVAR_AUTO_HOP: &str = "move.Pogo";

/// Console variable: let perfectly chained jumps exceed the boost cap.
pub const CVAR_BUNNYHOP: &str = "move.Bunnyhopping";

/// Process-wide movement toggles.
#[derive(Resource, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Holding jump keeps jumping whenever possible.
    pub auto_hop: bool,
    /// Jump boosts may ignore the overflow clamp.
    pub bunnyhop: bool,
}

impl SimulationConfig {
    /// Apply a console line such as `move.Pogo 1`.
    ///
    /// Returns the resulting value of the variable. A bare variable name just
    /// reports the current value.
    pub fn apply_console_command(&mut self, line: &str) -> Result<bool, String> {
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| "empty console command".to_string())?;

        let slot = if name.eq_ignore_ascii_case(CVAR_AUTO_HOP) {
            &mut self.auto_hop
        } else if name.eq_ignore_ascii_case(CVAR_BUNNYHOP) {
            &mut self.bunnyhop
        } else {
            return Err(format!("unknown console variable '{name}'"));
        };

        let Some(raw) = parts.next() else {
            return Ok(*slot);
        };
        if let Some(extra) = parts.next() {
            return Err(format!("unexpected argument '{extra}' for {name}"));
        }

        let value: i32 = raw
            .parse()
            .map_err(|e| format!("invalid value '{raw}' for {name}: {e}"))?;
        *slot = value != 0;
        Ok(*slot)
    }
}

/// Jump count and hold-time budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpTuning {
    /// Jumps allowed before landing. Values below 1 are treated as 1.
    pub max_count: u32,
    /// How long holding jump keeps the jump "active" (seconds). 0 disables hold jumps.
    pub max_hold_time: f32,
}

impl Default for JumpTuning {
    fn default() -> Self {
        Self {
            max_count: 1,
            max_hold_time: 0.0,
        }
    }
}

/// Jump boost percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostTuning {
    /// Share of forward input speed added on a normal jump.
    pub boost_percent: f32,
    /// Share used while sprinting or crouching.
    pub slowed_boost_percent: f32,
    /// Input pointing further back than this angle boosts backwards (degrees).
    pub backward_angle_degrees: f32,
}

impl Default for BoostTuning {
    fn default() -> Self {
        Self {
            boost_percent: 0.5,
            slowed_boost_percent: 0.1,
            backward_angle_degrees: 40.0,
        }
    }
}

/// Damage knockback constants (centimetres, cm/s).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseTuning {
    /// Capsule radius the knockback scale is normalized against.
    pub reference_radius: f32,
    /// Capsule half-height the knockback scale is normalized against.
    pub reference_half_height: f32,
    /// Damage to impulse multiplier.
    pub impulse_scale: f32,
    /// Cap on the upward component.
    pub max_upward: f32,
    /// Cap on the horizontal component, only enforced with `clamp_horizontal`.
    pub max_horizontal: f32,
    pub clamp_horizontal: bool,
}

impl Default for ImpulseTuning {
    fn default() -> Self {
        Self {
            reference_radius: 30.48,
            reference_half_height: 68.58,
            impulse_scale: 5.0 * 3.0 / 4.0,
            max_upward: 1238.25,
            max_horizontal: 1714.5,
            clamp_horizontal: false,
        }
    }
}

impl ImpulseTuning {
    /// Volume-like size of the reference capsule: `(2r)^2 * 2h`.
    pub fn reference_volume(&self) -> f32 {
        let diameter = self.reference_radius * 2.0;
        diameter * diameter * self.reference_half_height * 2.0
    }
}

/// Ground friction by stance, read by the host integrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionTuning {
    pub ground_friction: f32,
    pub crouching_ground_friction: f32,
}

impl Default for FrictionTuning {
    fn default() -> Self {
        Self {
            ground_friction: 2.0,
            crouching_ground_friction: 100.0,
        }
    }
}

/// Everything a character needs at spawn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub camera: CameraSettings,
    pub jump: JumpTuning,
    pub boost: BoostTuning,
    pub impulse: ImpulseTuning,
    pub friction: FrictionTuning,
    /// Per-character auto-bunnyhop (holding jump keeps hopping).
    pub auto_bunnyhop: bool,
    /// Initial values of the process-wide toggles.
    pub simulation: SimulationConfig,
}

impl AssistConfig {
    /// Parse a config from RON text. Missing fields keep their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| format!("failed to parse assist config: {e}"))
    }

    /// Load a config from a RON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
        let config = Self::from_ron_str(&text)?;
        info!("Loaded assist config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_toggles() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.apply_console_command("move.Pogo 1"), Ok(true));
        assert!(config.auto_hop);
        assert_eq!(config.apply_console_command("move.bunnyhopping 2"), Ok(true));
        assert!(config.bunnyhop);
        assert_eq!(config.apply_console_command("move.Pogo 0"), Ok(false));
        assert!(!config.auto_hop);
    }

    #[test]
    fn test_console_query_does_not_change_value() {
        let mut config = SimulationConfig {
            auto_hop: true,
            bunnyhop: false,
        };
        assert_eq!(config.apply_console_command("move.Pogo"), Ok(true));
        assert!(config.auto_hop);
    }

    #[test]
    fn test_console_rejects_garbage() {
        let mut config = SimulationConfig::default();
        assert!(config.apply_console_command("").is_err());
        assert!(config.apply_console_command("move.Fly 1").is_err());
        assert!(config.apply_console_command("move.Pogo yes").is_err());
        assert!(config.apply_console_command("move.Pogo 1 2").is_err());
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let text = r#"(
            camera: (sensitivity_x: 30.0),
            jump: (max_count: 2),
            auto_bunnyhop: true,
            simulation: (bunnyhop: true),
        )"#;
        let config = AssistConfig::from_ron_str(text).unwrap();
        assert_eq!(config.camera.sensitivity_x, 30.0);
        assert_eq!(config.camera.sensitivity_y, 50.0);
        assert_eq!(config.jump.max_count, 2);
        assert_eq!(config.jump.max_hold_time, 0.0);
        assert!(config.auto_bunnyhop);
        assert!(config.simulation.bunnyhop);
        assert!(!config.simulation.auto_hop);
        assert_eq!(config.impulse, ImpulseTuning::default());
    }

    #[test]
    fn test_bad_ron_reports_error() {
        let err = AssistConfig::from_ron_str("(jump: (max_count: -1))").unwrap_err();
        assert!(err.contains("failed to parse assist config"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AssistConfig::load_from_file("/definitely/not/here.ron").unwrap_err();
        assert!(err.contains("not/here.ron"));
    }
}
