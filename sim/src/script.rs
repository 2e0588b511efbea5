//! Scripted controls for the headless run.
//!
//! Holds forward the whole time, taps jump on every landing, flips the bunnyhop
//! toggle halfway and takes an upward hit near the end.

use assist::prelude::*;
use bevy::app::AppExit;
use bevy::prelude::*;

use crate::integrator::SimPosition;

#[derive(Component)]
pub struct Scripted;

#[derive(Resource, Clone, Debug)]
pub struct ScriptTimeline {
    pub bunnyhop_at: f32,
    pub damage_at: f32,
    pub end_at: f32,
    bunnyhop_sent: bool,
    damage_sent: bool,
}

impl Default for ScriptTimeline {
    fn default() -> Self {
        Self {
            bunnyhop_at: 4.0,
            damage_at: 7.0,
            end_at: 10.0,
            bunnyhop_sent: false,
            damage_sent: false,
        }
    }
}

pub fn drive_script(
    time: Res<Time>,
    mut timeline: ResMut<ScriptTimeline>,
    mut characters: Query<(Entity, &MovementState, &mut PlayerIntent), With<Scripted>>,
    mut console: MessageWriter<ConsoleCommand>,
    mut damage: MessageWriter<DamageMomentum>,
) {
    let now = time.elapsed_secs();

    if !timeline.bunnyhop_sent && now >= timeline.bunnyhop_at {
        timeline.bunnyhop_sent = true;
        console.write(ConsoleCommand(format!("{CVAR_BUNNYHOP} 1")));
    }

    for (entity, movement, mut intent) in characters.iter_mut() {
        intent.move_forward = 1.0;
        // Tap on the ground, release in the air.
        intent.jump_held = movement.is_moving_on_ground() && !intent.jump_held;

        if !timeline.damage_sent && now >= timeline.damage_at {
            damage.write(DamageMomentum {
                entity,
                request: DamageImpulseRequest {
                    damage: 120.0,
                    direction: Vec3::new(0.0, 0.8, 0.6).normalize(),
                    contact_point: Vec3::ZERO,
                    scale_by_mass: false,
                },
            });
        }
    }
    if now >= timeline.damage_at {
        timeline.damage_sent = true;
    }
}

pub fn log_events(
    mut liftoffs: MessageReader<JumpLiftoff>,
    mut mode_changes: MessageReader<MovementModeChanged>,
    characters: Query<(&MovementState, &SimPosition)>,
) {
    for JumpLiftoff { entity, outcome } in liftoffs.read() {
        let Ok((movement, position)) = characters.get(*entity) else {
            continue;
        };
        info!(
            "liftoff at ({:.0}, {:.0}): {:?}, horizontal speed {:.1}",
            position.0.x,
            position.0.z,
            outcome,
            Vec3::new(movement.velocity.x, 0.0, movement.velocity.z).length()
        );
    }
    for MovementModeChanged { entity, transition } in mode_changes.read() {
        debug!("{:?}: {:?} -> {:?}", entity, transition.previous, transition.current);
    }
}

pub fn stop_when_done(
    time: Res<Time>,
    timeline: Res<ScriptTimeline>,
    characters: Query<(&MovementState, &SimPosition), With<Scripted>>,
    mut exit: MessageWriter<AppExit>,
) {
    if time.elapsed_secs() < timeline.end_at {
        return;
    }
    for (movement, position) in characters.iter() {
        info!(
            "finished at {:?}, velocity {:?}, mode {:?}",
            position.0, movement.velocity, movement.mode
        );
    }
    exit.write(AppExit::Success);
}
