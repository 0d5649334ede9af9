//! First-person character locomotion: input latching, the stance/velocity
//! state machine, and the motor boundary it drives.

pub mod body_rig;
pub mod constants;
pub mod flashlight;
pub mod input;
pub mod locomotion;
pub mod math;
pub mod motor;
pub mod state;

pub use body_rig::BodyRig;
pub use flashlight::{Flashlight, LightToggle};
pub use input::{CharacterInput, CrouchInput, RawInput, RequestLatches};
pub use locomotion::{JumpTimers, PlayerCharacter};
pub use motor::{
    CapsuleDimensions, CharacterController, CharacterHit, CharacterMotor, ColliderId, GroundingStatus,
    HitStabilityReport, LayerMask, OverlapBuffer, TriggerInteraction,
};
pub use state::{CharacterState, Stance};
