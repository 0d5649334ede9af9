use nalgebra::Vector3;

/// Locomotion mode of the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stance {
    #[default]
    Stand,
    Crouch,
    Slide,
    /// Reserved; nothing transitions here yet.
    Wallrun,
    /// Reserved; nothing transitions here yet.
    RailGrind,
}

impl Stance {
    /// Whether the capsule is kept at crouch height in this stance.
    pub fn is_lowered(self) -> bool {
        !matches!(self, Stance::Stand)
    }
}

/// Snapshot of the character mirrored from the motor at the end of every update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CharacterState {
    pub grounded: bool,
    pub stance: Stance,
    pub velocity: Vector3<f32>,
}
