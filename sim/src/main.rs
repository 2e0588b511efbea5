//! Headless movement sim - runs one scripted character through the assist layer
//!
//! Usage: `sim [assist.ron]`

mod integrator;
mod script;

use std::time::Duration;

use assist::prelude::*;
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use integrator::SimPosition;
use script::{Scripted, ScriptTimeline};

/// Fixed simulation rate (Hz).
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ)
}

#[derive(Resource, Clone, Debug, Default)]
struct LoadedConfig(AssistConfig);

fn load_config() -> AssistConfig {
    let Some(path) = std::env::args().nth(1) else {
        info!("No config path given, using defaults");
        return AssistConfig::default();
    };
    match AssistConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            AssistConfig::default()
        }
    }
}

fn spawn_character(mut commands: Commands, config: Res<LoadedConfig>) {
    let movement = MovementState::default();
    let character = AssistCharacter::spawn(&config.0, &movement);
    info!(
        "Spawning character: max jump time {:.3}s, pitch limits [{}, {}]",
        character.jump.max_jump_time,
        character.view_limits().min_pitch(),
        character.view_limits().max_pitch()
    );
    commands.spawn((
        Scripted,
        movement,
        character,
        PlayerIntent::default(),
        CapsuleShape::default(),
        SimPosition::default(),
    ));
}

fn main() {
    let mut app = App::new();

    // Run the main loop at the fixed tick so messages written in FixedUpdate are
    // read before they are cleared.
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.add_plugins(bevy::log::LogPlugin::default());
    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));

    app.add_plugins(MovementAssistPlugin);

    // Needs LogPlugin for the load messages.
    let config = load_config();
    app.insert_resource(config.simulation.clone());
    app.insert_resource(LoadedConfig(config));
    app.init_resource::<ScriptTimeline>();

    app.add_systems(Startup, spawn_character);
    app.add_systems(FixedUpdate, script::drive_script.before(AssistSet::Input));
    app.add_systems(
        FixedUpdate,
        integrator::integrate_characters.in_set(AssistSet::Integrate),
    );
    app.add_systems(
        FixedUpdate,
        (script::log_events, script::stop_when_done)
            .chain()
            .after(AssistSet::Track),
    );

    info!("Starting movement sim at {} Hz", FIXED_TIMESTEP_HZ);
    app.run();
}
