//! Movement assist layer for a first-person character.
//!
//! Sits on top of a movement integrator (anything implementing
//! [`facade::MovementFacade`]) and adds:
//! - camera look and move input mapping with pitch limits
//! - jump gating by count, hold time and floor slope
//! - a forward speed boost on liftoff, including the bunnyhop variant
//! - damage knockback scaled by capsule size
//!
//! [`plugin::MovementAssistPlugin`] runs it all in `FixedUpdate`; the modules are
//! plain functions over the facade so a host can also drive them directly.

pub mod character;
pub mod config;
pub mod facade;
pub mod impulse;
pub mod input;
pub mod jump;
pub mod plugin;

pub mod prelude {
    pub use crate::character::{AssistCharacter, JumpTick};
    pub use crate::config::{
        AssistConfig, BoostTuning, FrictionTuning, ImpulseTuning, JumpTuning, SimulationConfig, CVAR_AUTO_HOP,
        CVAR_BUNNYHOP,
    };
    pub use crate::facade::{FloorContact, MovementFacade, MovementMode, MovementState, NoClipVerticalMove};
    pub use crate::impulse::{CapsuleShape, DamageImpulseRequest, ResolvedImpulse};
    pub use crate::input::{CameraSettings, ControlRotation, ViewLimits};
    pub use crate::jump::boost::BoostOutcome;
    pub use crate::jump::gate::JumpDenial;
    pub use crate::jump::{JumpPhase, JumpState, MovementModeTransition, Stance};
    pub use crate::plugin::{
        AssistSet, ConsoleCommand, DamageMomentum, JumpLiftoff, MovementAssistPlugin, MovementModeChanged,
        PlayerIntent,
    };
}
