//! Per-character glue between the host and the assist modules.
//!
//! [`AssistCharacter`] owns the jump state, camera limiter and tuning for one
//! character and exposes the calls a host makes during a tick, in the order it
//! should make them: look/move input, jump input check, (integrator), mode
//! tracking, damage, jump input clear.

use bevy::prelude::*;

use crate::config::{AssistConfig, BoostTuning, FrictionTuning, ImpulseTuning, SimulationConfig};
use crate::facade::{MovementFacade, MovementMode};
use crate::impulse::{self, CapsuleShape, DamageImpulseRequest, ResolvedImpulse};
use crate::input::{self, CameraSettings, ControlRotation, ViewLimits};
use crate::jump::boost::{self, BoostOutcome};
use crate::jump::gate;
use crate::jump::{JumpState, MovementModeTransition, Stance};

/// What happened during one jump input check.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpTick {
    /// Set when the character left the ground this tick.
    pub boost: Option<BoostOutcome>,
    /// Set when launching switched the movement mode.
    pub transition: Option<MovementModeTransition>,
}

#[derive(Component, Clone, Debug)]
pub struct AssistCharacter {
    pub jump: JumpState,
    pub control_rotation: ControlRotation,
    pub stance: Stance,
    pub auto_bunnyhop: bool,
    camera: CameraSettings,
    view_limits: ViewLimits,
    boost: BoostTuning,
    impulse: ImpulseTuning,
    friction: FrictionTuning,
    /// Mode seen at the end of the last tracked step.
    observed_mode: MovementMode,
}

impl AssistCharacter {
    /// Build a character at spawn. The jump arc time and camera limits are fixed here.
    pub fn spawn(config: &AssistConfig, movement: &impl MovementFacade) -> Self {
        let max_jump_time = boost::max_jump_time(movement.jump_velocity(), movement.gravity_y());
        Self {
            jump: JumpState::new(&config.jump, max_jump_time),
            control_rotation: ControlRotation::default(),
            stance: Stance::default(),
            auto_bunnyhop: config.auto_bunnyhop,
            camera: config.camera.clone(),
            view_limits: ViewLimits::from_camera(&config.camera),
            boost: config.boost.clone(),
            impulse: config.impulse.clone(),
            friction: config.friction.clone(),
            observed_mode: movement.movement_mode(),
        }
    }

    pub fn camera(&self) -> &CameraSettings {
        &self.camera
    }

    /// Pitch limiter to hand to the host camera.
    pub fn view_limits(&self) -> ViewLimits {
        self.view_limits
    }

    /// The body follows control yaw only.
    pub fn actor_forward(&self) -> Vec3 {
        self.control_rotation.without_pitch().forward()
    }

    pub fn ground_friction(&self) -> f32 {
        if self.stance.crouching {
            self.friction.crouching_ground_friction
        } else {
            self.friction.ground_friction
        }
    }

    pub fn add_look_input(&mut self, raw_yaw: f32, raw_pitch: f32, elapsed_seconds: f32) {
        let (yaw_delta, pitch_delta) = input::map_look(&self.camera, raw_yaw, raw_pitch, elapsed_seconds);
        self.control_rotation.apply_look(yaw_delta, pitch_delta, &self.view_limits);
    }

    /// Feed forward/right axis samples to the integrator as world-space input.
    pub fn add_move_input(&self, forward_axis: f32, right_axis: f32, movement: &mut impl MovementFacade) {
        let grounded_or_falling = movement.is_moving_on_ground() || movement.is_falling();
        let forward = input::resolve_forward_direction(self.control_rotation, grounded_or_falling);
        let right = input::resolve_right_direction(self.control_rotation);
        movement.add_input_vector(input::map_move(forward, forward_axis) + input::map_move(right, right_axis));
    }

    /// Jump key went down.
    pub fn jump(&mut self) {
        gate::press(&mut self.jump);
    }

    /// Jump key went up.
    pub fn stop_jumping(&mut self, movement: &mut impl MovementFacade) {
        gate::stop_jumping(&mut self.jump, movement);
    }

    pub fn can_jump(&self, movement: &impl MovementFacade) -> bool {
        gate::can_jump(&self.jump, movement)
    }

    /// Gate the pending jump, launch, and boost on liftoff.
    pub fn tick_jump_input(
        &mut self,
        movement: &mut impl MovementFacade,
        config: &SimulationConfig,
        now: f32,
    ) -> JumpTick {
        let before = movement.movement_mode();
        let liftoff = gate::check_jump_input(&mut self.jump, movement, now);

        let mut tick = JumpTick::default();
        // Launching switches mode inside the integrator; settle the books before boosting.
        if movement.movement_mode() != before {
            tick.transition = Some(self.movement_mode_changed(movement, before, now));
        }
        if liftoff.is_some() {
            let facing = self.actor_forward();
            tick.boost = Some(boost::on_jumped(
                &mut self.jump,
                movement,
                facing,
                self.stance,
                &self.boost,
                config,
                now,
            ));
        }
        tick
    }

    /// Compare against the last observed mode and update jump state on a change.
    pub fn track_movement_mode(&mut self, movement: &impl MovementFacade, now: f32) -> Option<MovementModeTransition> {
        let previous = self.observed_mode;
        if movement.movement_mode() == previous {
            return None;
        }
        Some(self.movement_mode_changed(movement, previous, now))
    }

    fn movement_mode_changed(
        &mut self,
        movement: &impl MovementFacade,
        previous: MovementMode,
        now: f32,
    ) -> MovementModeTransition {
        self.observed_mode = movement.movement_mode();
        gate::on_movement_mode_changed(&mut self.jump, movement, previous, now)
    }

    pub fn clear_jump_input(&mut self, movement: &impl MovementFacade, config: &SimulationConfig, dt: f32) {
        gate::clear_jump_input(&mut self.jump, movement, self.auto_bunnyhop, config, dt);
    }

    pub fn apply_damage_momentum(
        &self,
        request: &DamageImpulseRequest,
        capsule: &CapsuleShape,
        movement: &mut impl MovementFacade,
    ) -> ResolvedImpulse {
        impulse::apply_damage_momentum(request, capsule, movement, &self.impulse)
    }

    pub fn toggle_noclip(&mut self, movement: &mut impl MovementFacade) {
        movement.toggle_noclip();
        info!("noclip {}", if movement.is_cheat_flying() { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::{MovementState, NoClipVerticalMove};
    use crate::jump::JumpPhase;

    const DT: f32 = 1.0 / 60.0;

    fn spawn(config: &AssistConfig) -> (AssistCharacter, MovementState) {
        let movement = MovementState::default();
        (AssistCharacter::spawn(config, &movement), movement)
    }

    #[test]
    fn test_spawn_derives_arc_time_and_limits() {
        let config = AssistConfig {
            camera: CameraSettings {
                min_pitch: -70.0,
                max_pitch: 60.0,
                ..default()
            },
            ..default()
        };
        let (character, _) = spawn(&config);
        assert!((character.jump.max_jump_time - 1680.0 / 2940.0).abs() < 1e-5);
        assert_eq!(character.view_limits().max_pitch(), 60.0);
        assert_eq!(character.view_limits().min_pitch(), -70.0);
    }

    #[test]
    fn test_look_input_respects_limits() {
        let (mut character, _) = spawn(&AssistConfig::default());
        // 50 sensitivity * 1s * 3 = 150 degrees of pitch requested.
        character.add_look_input(0.0, 3.0, 1.0);
        assert_eq!(character.control_rotation.pitch, 90.0);
    }

    #[test]
    fn test_move_input_is_horizontal_on_ground() {
        let (mut character, mut movement) = spawn(&AssistConfig::default());
        character.control_rotation = ControlRotation::new(0.0, -45.0);
        character.add_move_input(1.0, 0.0, &mut movement);
        let input = movement.consume_input_vector();
        assert!((input - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_jump_tick_boosts_on_liftoff() {
        let (mut character, mut movement) = spawn(&AssistConfig::default());
        movement.velocity = Vec3::NEG_Z * 300.0;
        movement.last_input = Vec3::NEG_Z;

        character.jump();
        let tick = character.tick_jump_input(&mut movement, &SimulationConfig::default(), 1.0);

        let transition = tick.transition.unwrap();
        assert_eq!(transition.previous, MovementMode::Walking);
        assert_eq!(transition.current, MovementMode::Falling);
        assert!(matches!(tick.boost, Some(BoostOutcome::Applied { .. })));
        assert!(movement.velocity.z < -300.0);
        assert_eq!(character.jump.current_count, 1);
        // The launch was already tracked.
        assert_eq!(character.track_movement_mode(&movement, 1.0), None);
    }

    #[test]
    fn test_landing_is_tracked_once() {
        let (mut character, mut movement) = spawn(&AssistConfig::default());
        let config = SimulationConfig::default();
        character.jump();
        character.tick_jump_input(&mut movement, &config, 0.0);
        character.clear_jump_input(&movement, &config, DT);

        movement.land_on(Vec3::Y);
        let landed = character.track_movement_mode(&movement, 0.7);
        assert_eq!(landed.map(|t| t.current), Some(MovementMode::Walking));
        assert_eq!(character.track_movement_mode(&movement, 0.8), None);
        assert_eq!(character.jump.current_count, 0);
        assert_eq!(character.jump.phase, JumpPhase::Grounded);
    }

    #[test]
    fn test_auto_bunnyhop_boosts_once_per_arc() {
        let config = AssistConfig {
            auto_bunnyhop: true,
            ..default()
        };
        let (mut character, mut movement) = spawn(&config);
        let sim = SimulationConfig::default();
        movement.velocity = Vec3::NEG_Z * 400.0;
        movement.last_input = Vec3::NEG_Z;

        character.jump();
        let first = character.tick_jump_input(&mut movement, &sim, 0.0);
        assert!(matches!(first.boost, Some(BoostOutcome::Applied { .. })));
        character.clear_jump_input(&movement, &sim, DT);
        assert!(character.jump.pressed);

        // Land early (e.g. on a ledge) and hop again inside the arc window.
        movement.land_on(Vec3::Y);
        character.track_movement_mode(&movement, 0.3);
        let horizontal_before = Vec3::new(movement.velocity.x, 0.0, movement.velocity.z);
        let second = character.tick_jump_input(&mut movement, &sim, 0.3);
        assert_eq!(second.boost, Some(BoostOutcome::Throttled));
        assert_eq!(Vec3::new(movement.velocity.x, 0.0, movement.velocity.z), horizontal_before);
    }

    #[test]
    fn test_steep_floor_blocks_jump() {
        let (mut character, mut movement) = spawn(&AssistConfig::default());
        movement.floor.impact_normal = Vec3::new(0.8, 0.6, 0.0);
        character.jump();
        let tick = character.tick_jump_input(&mut movement, &SimulationConfig::default(), 0.0);
        assert_eq!(tick, JumpTick::default());
        assert_eq!(character.jump.phase, JumpPhase::JumpDenied);
        assert_eq!(movement.mode, MovementMode::Walking);
    }

    #[test]
    fn test_noclip_jump_lifts() {
        let (mut character, mut movement) = spawn(&AssistConfig::default());
        character.toggle_noclip(&mut movement);
        assert!(movement.cheat_flying);

        character.jump();
        let tick = character.tick_jump_input(&mut movement, &SimulationConfig::default(), 0.0);
        assert_eq!(tick.boost, Some(BoostOutcome::NoClipLift));
        assert_eq!(movement.noclip_vertical_move, NoClipVerticalMove::Up);

        character.stop_jumping(&mut movement);
        assert_eq!(movement.noclip_vertical_move, NoClipVerticalMove::None);
    }

    #[test]
    fn test_crouch_friction() {
        let (mut character, _) = spawn(&AssistConfig::default());
        assert_eq!(character.ground_friction(), 2.0);
        character.stance.crouching = true;
        assert_eq!(character.ground_friction(), 100.0);
    }
}
