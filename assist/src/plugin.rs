//! Bevy wiring for the assist layer.
//!
//! Systems run in `FixedUpdate` in the [`AssistSet`] order. The host integrator
//! goes in [`AssistSet::Integrate`]; it reads `MovementState::last_input` (already
//! consumed at the end of [`AssistSet::Input`]), moves the character and updates
//! the movement mode.

use bevy::prelude::*;

use crate::character::AssistCharacter;
use crate::config::SimulationConfig;
use crate::facade::MovementState;
use crate::impulse::{CapsuleShape, DamageImpulseRequest};
use crate::jump::boost::BoostOutcome;
use crate::jump::{MovementModeTransition, Stance};

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssistSet {
    /// Console toggles, look/move mapping, input consumption, jump key edges.
    Input,
    /// Jump gate, liftoff boost and damage knockback.
    Jump,
    /// Host movement integrator.
    Integrate,
    /// Mode tracking and end-of-tick jump bookkeeping.
    Track,
}

/// Raw controls for one character, written by the host every tick.
#[derive(Component, Clone, Debug, Default)]
pub struct PlayerIntent {
    /// Look axis samples (mouse delta or stick).
    pub look_yaw: f32,
    pub look_pitch: f32,
    /// Move axes in [-1, 1].
    pub move_forward: f32,
    pub move_right: f32,
    pub jump_held: bool,
    pub sprint: bool,
    pub crouch: bool,
    /// One-shot; cleared once handled.
    pub toggle_noclip: bool,
    jump_was_held: bool,
}

/// A console line such as `move.Bunnyhopping 1`.
#[derive(Message, Clone, Debug)]
pub struct ConsoleCommand(pub String);

/// Knockback request for one character.
#[derive(Message, Clone, Debug)]
pub struct DamageMomentum {
    pub entity: Entity,
    pub request: DamageImpulseRequest,
}

/// Written after the jump state has been updated for the new mode.
#[derive(Message, Clone, Debug)]
pub struct MovementModeChanged {
    pub entity: Entity,
    pub transition: MovementModeTransition,
}

#[derive(Message, Clone, Debug)]
pub struct JumpLiftoff {
    pub entity: Entity,
    pub outcome: BoostOutcome,
}

pub struct MovementAssistPlugin;

impl Plugin for MovementAssistPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>();
        app.add_message::<ConsoleCommand>();
        app.add_message::<DamageMomentum>();
        app.add_message::<MovementModeChanged>();
        app.add_message::<JumpLiftoff>();

        app.configure_sets(
            FixedUpdate,
            (
                AssistSet::Input,
                AssistSet::Jump,
                AssistSet::Integrate,
                AssistSet::Track,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                (
                    apply_console_commands,
                    map_player_input,
                    consume_move_input,
                    process_jump_buttons,
                )
                    .chain()
                    .in_set(AssistSet::Input),
                (check_jump_input, apply_damage_momentum)
                    .chain()
                    .in_set(AssistSet::Jump),
                (track_movement_mode, clear_jump_input)
                    .chain()
                    .in_set(AssistSet::Track),
            ),
        );
    }
}

fn apply_console_commands(mut commands: MessageReader<ConsoleCommand>, mut config: ResMut<SimulationConfig>) {
    for ConsoleCommand(line) in commands.read() {
        match config.apply_console_command(line) {
            Ok(value) => info!("console: {} -> {}", line, value as u8),
            Err(e) => warn!("console: {}", e),
        }
    }
}

fn map_player_input(
    time: Res<Time>,
    mut characters: Query<(&mut AssistCharacter, &mut MovementState, &mut PlayerIntent)>,
) {
    let dt = time.delta_secs();
    for (mut character, mut movement, mut intent) in characters.iter_mut() {
        if intent.toggle_noclip {
            intent.toggle_noclip = false;
            character.toggle_noclip(movement.as_mut());
        }

        character.stance = Stance {
            sprinting: intent.sprint,
            crouching: intent.crouch,
        };
        character.add_look_input(intent.look_yaw, intent.look_pitch, dt);
        character.add_move_input(intent.move_forward, intent.move_right, movement.as_mut());
    }
}

/// Latch this tick's move input so the jump boost and the integrator see the same vector.
fn consume_move_input(mut characters: Query<&mut MovementState, With<AssistCharacter>>) {
    for mut movement in characters.iter_mut() {
        movement.consume_input_vector();
    }
}

fn process_jump_buttons(mut characters: Query<(&mut AssistCharacter, &mut MovementState, &mut PlayerIntent)>) {
    for (mut character, mut movement, mut intent) in characters.iter_mut() {
        match (intent.jump_held, intent.jump_was_held) {
            (true, false) => character.jump(),
            (false, true) => character.stop_jumping(movement.as_mut()),
            _ => {}
        }
        intent.jump_was_held = intent.jump_held;
    }
}

fn check_jump_input(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut characters: Query<(Entity, &mut AssistCharacter, &mut MovementState)>,
    mut mode_changes: MessageWriter<MovementModeChanged>,
    mut liftoffs: MessageWriter<JumpLiftoff>,
) {
    let now = time.elapsed_secs();
    for (entity, mut character, mut movement) in characters.iter_mut() {
        let tick = character.tick_jump_input(movement.as_mut(), &config, now);
        if let Some(transition) = tick.transition {
            mode_changes.write(MovementModeChanged { entity, transition });
        }
        if let Some(outcome) = tick.boost {
            liftoffs.write(JumpLiftoff { entity, outcome });
        }
    }
}

/// Knockback is applied in the order the requests were written.
fn apply_damage_momentum(
    mut requests: MessageReader<DamageMomentum>,
    mut characters: Query<(&AssistCharacter, &mut MovementState, Option<&CapsuleShape>)>,
) {
    for DamageMomentum { entity, request } in requests.read() {
        let Ok((character, mut movement, capsule)) = characters.get_mut(*entity) else {
            warn!("damage momentum for unknown character {:?}", entity);
            continue;
        };
        let capsule = capsule.copied().unwrap_or_default();
        let resolved = character.apply_damage_momentum(request, &capsule, movement.as_mut());
        debug!(
            "knockback on {:?}: damage {:.1}, delta {:?}",
            entity, request.damage, resolved.velocity_delta
        );
    }
}

fn track_movement_mode(
    time: Res<Time>,
    mut characters: Query<(Entity, &mut AssistCharacter, &MovementState)>,
    mut mode_changes: MessageWriter<MovementModeChanged>,
) {
    let now = time.elapsed_secs();
    for (entity, mut character, movement) in characters.iter_mut() {
        if let Some(transition) = character.track_movement_mode(movement, now) {
            trace!("{:?}: {:?} -> {:?}", entity, transition.previous, transition.current);
            mode_changes.write(MovementModeChanged { entity, transition });
        }
    }
}

fn clear_jump_input(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut characters: Query<(&mut AssistCharacter, &MovementState)>,
) {
    let dt = time.delta_secs();
    for (mut character, movement) in characters.iter_mut() {
        character.clear_jump_input(movement, &config, dt);
    }
}
