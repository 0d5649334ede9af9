//! Per-frame input snapshots and the request latches they drive.

use nalgebra::{UnitQuaternion, Vector2, Vector3};

use super::math::clamp_magnitude;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrouchInput {
    #[default]
    None,
    Toggle,
}

/// Input for one tick, already shaped by [`CharacterInput::from_raw`] or an equivalent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterInput {
    pub rotation: UnitQuaternion<f32>,
    /// Strafe on x, forward on y. Magnitude is clamped to 1 when latched.
    pub move_axis: Vector2<f32>,
    /// Jump pressed this frame.
    pub jump: bool,
    /// Jump button held.
    pub jump_sustain: bool,
    pub crouch: CrouchInput,
    pub flashlight: bool,
}

impl Default for CharacterInput {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            move_axis: Vector2::zeros(),
            jump: false,
            jump_sustain: false,
            crouch: CrouchInput::None,
            flashlight: false,
        }
    }
}

/// Device-agnostic button and axis readings for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInput {
    pub look_rotation: UnitQuaternion<f32>,
    pub move_axis: Vector2<f32>,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub crouch_pressed: bool,
    pub flashlight_pressed: bool,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            look_rotation: UnitQuaternion::identity(),
            move_axis: Vector2::zeros(),
            jump_pressed: false,
            jump_held: false,
            crouch_pressed: false,
            flashlight_pressed: false,
        }
    }
}

impl CharacterInput {
    /// Applies a radial deadzone to the move axis and maps a crouch press to a toggle.
    pub fn from_raw(raw: &RawInput, deadzone: f32) -> Self {
        let magnitude = raw.move_axis.norm();
        let move_axis = if !magnitude.is_finite() || magnitude <= deadzone {
            Vector2::zeros()
        } else {
            let rescaled = ((magnitude - deadzone) / (1.0 - deadzone).max(f32::EPSILON)).min(1.0);
            raw.move_axis * (rescaled / magnitude)
        };

        Self {
            rotation: raw.look_rotation,
            move_axis,
            jump: raw.jump_pressed,
            jump_sustain: raw.jump_held,
            crouch: if raw.crouch_pressed {
                CrouchInput::Toggle
            } else {
                CrouchInput::None
            },
            flashlight: raw.flashlight_pressed,
        }
    }
}

/// Requests that persist between ticks until the state machine consumes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestLatches {
    pub rotation: UnitQuaternion<f32>,
    /// World-space, orientation-relative, magnitude at most 1.
    pub movement: Vector3<f32>,
    pub jump: bool,
    pub jump_sustain: bool,
    pub crouch: bool,
    pub crouch_in_air: bool,
    pub flashlight: bool,
}

impl Default for RequestLatches {
    fn default() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            movement: Vector3::zeros(),
            jump: false,
            jump_sustain: false,
            crouch: false,
            crouch_in_air: false,
            flashlight: false,
        }
    }
}

/// Edges detected while latching an input; the caller owns the timers they reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchEdges {
    pub jump_started: bool,
}

impl RequestLatches {
    /// Folds one input snapshot into the latches.
    ///
    /// `grounded` is the character's grounded flag from the last completed update.
    pub fn apply(&mut self, input: &CharacterInput, grounded: bool) -> LatchEdges {
        self.rotation = input.rotation;

        let planar = Vector3::new(input.move_axis.x, 0.0, input.move_axis.y);
        let planar = if planar.iter().all(|c| c.is_finite()) {
            clamp_magnitude(&planar, 1.0)
        } else {
            Vector3::zeros()
        };
        self.movement = input.rotation * planar;

        let was_requesting_jump = self.jump;
        self.jump = self.jump || input.jump;
        let jump_started = self.jump && !was_requesting_jump;
        self.jump_sustain = input.jump_sustain;

        let was_requesting_crouch = self.crouch;
        self.crouch = match input.crouch {
            CrouchInput::Toggle => !self.crouch,
            CrouchInput::None => self.crouch,
        };
        if self.crouch && !was_requesting_crouch {
            self.crouch_in_air = !grounded;
        } else if !self.crouch && was_requesting_crouch {
            self.crouch_in_air = false;
        }

        self.flashlight = input.flashlight;

        LatchEdges { jump_started }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_axis(x: f32, y: f32) -> CharacterInput {
        CharacterInput {
            move_axis: Vector2::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn test_diagonal_movement_is_clamped() {
        let mut latches = RequestLatches::default();
        latches.apply(&input_with_axis(1.0, 1.0), true);
        assert!((latches.movement.norm() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_movement_follows_orientation() {
        let mut latches = RequestLatches::default();
        let quarter_turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let input = CharacterInput {
            rotation: quarter_turn,
            ..input_with_axis(0.0, 1.0)
        };
        latches.apply(&input, true);
        assert!((latches.movement - Vector3::new(1.0, 0.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn test_non_finite_axis_is_ignored() {
        let mut latches = RequestLatches::default();
        latches.apply(&input_with_axis(f32::NAN, 1.0), true);
        assert_eq!(latches.movement, Vector3::zeros());
    }

    #[test]
    fn test_jump_is_sticky_and_edge_reported_once() {
        let mut latches = RequestLatches::default();
        let press = CharacterInput {
            jump: true,
            ..Default::default()
        };
        assert!(latches.apply(&press, true).jump_started);
        assert!(!latches.apply(&press, true).jump_started, "already pending");
        assert!(!latches.apply(&CharacterInput::default(), true).jump_started);
        assert!(latches.jump, "request stays latched without input");
    }

    #[test]
    fn test_crouch_toggle_and_in_air_latch() {
        let mut latches = RequestLatches::default();
        let toggle = CharacterInput {
            crouch: CrouchInput::Toggle,
            ..Default::default()
        };

        latches.apply(&toggle, false);
        assert!(latches.crouch);
        assert!(latches.crouch_in_air);

        latches.apply(&CharacterInput::default(), true);
        assert!(latches.crouch, "None keeps the toggle");
        assert!(latches.crouch_in_air);

        latches.apply(&toggle, true);
        assert!(!latches.crouch);
        assert!(!latches.crouch_in_air);

        latches.apply(&toggle, true);
        assert!(latches.crouch);
        assert!(!latches.crouch_in_air, "crouched on the ground");
    }

    #[test]
    fn test_flashlight_mirrors_input() {
        let mut latches = RequestLatches::default();
        latches.apply(
            &CharacterInput {
                flashlight: true,
                ..Default::default()
            },
            true,
        );
        assert!(latches.flashlight);
        latches.apply(&CharacterInput::default(), true);
        assert!(!latches.flashlight);
    }

    #[test]
    fn test_from_raw_deadzone_and_crouch_toggle() {
        let raw = RawInput {
            move_axis: Vector2::new(0.05, 0.0),
            crouch_pressed: true,
            jump_held: true,
            ..Default::default()
        };
        let input = CharacterInput::from_raw(&raw, 0.1);
        assert_eq!(input.move_axis, Vector2::zeros());
        assert_eq!(input.crouch, CrouchInput::Toggle);
        assert!(input.jump_sustain);
        assert!(!input.jump);

        let full = RawInput {
            move_axis: Vector2::new(0.0, 1.0),
            ..Default::default()
        };
        let input = CharacterInput::from_raw(&full, 0.1);
        assert!((input.move_axis.y - 1.0).abs() < 1.0e-6);
    }
}
