//! Locomotion and motor tuning defaults.
//! Config structs fall back to these when a field is omitted.

/// Grounded and airborne movement defaults
pub mod movement {
    /// Standing top speed in m/s
    pub const WALK_SPEED: f32 = 20.0;

    /// Crouching top speed in m/s
    pub const CROUCH_SPEED: f32 = 7.0;

    /// Exponential response rate toward the standing target velocity
    pub const WALK_RESPONSE: f32 = 25.0;

    /// Exponential response rate toward the crouching target velocity
    pub const CROUCH_RESPONSE: f32 = 20.0;

    /// Planar speed cap for air control
    pub const AIR_SPEED: f32 = 15.0;

    /// Air control acceleration in m/s²
    pub const AIR_ACCELERATION: f32 = 70.0;

    /// Minimum upward speed granted by a jump
    pub const JUMP_SPEED: f32 = 20.0;

    /// Grace window after leaving ground, and lifetime of a buffered jump
    pub const COYOTE_TIME: f32 = 0.2;

    /// Gravity multiplier while jump is held and rising
    pub const JUMP_SUSTAIN_GRAVITY: f32 = 0.4;

    /// Gravity along the up axis (negative pulls down)
    pub const GRAVITY: f32 = -90.0;
}

/// Slide defaults
pub mod slide {
    pub const START_SPEED: f32 = 25.0;
    pub const END_SPEED: f32 = 15.0;
    pub const FRICTION: f32 = 0.8;
    pub const STEER_ACCELERATION: f32 = 5.0;
    pub const GRAVITY: f32 = -90.0;
}

/// Capsule and camera rig defaults
pub mod body {
    /// Capsule height while standing
    pub const STAND_HEIGHT: f32 = 2.0;

    /// Capsule height while crouching or sliding
    pub const CROUCH_HEIGHT: f32 = 1.0;

    /// Response rate of the camera anchor and body scale blend
    pub const CROUCH_HEIGHT_RESPONSE: f32 = 15.0;

    /// Camera anchor height as a fraction of capsule height (standing)
    pub const STAND_CAMERA_TARGET_HEIGHT: f32 = 0.9;

    /// Camera anchor height as a fraction of capsule height (crouched)
    pub const CROUCH_CAMERA_TARGET_HEIGHT: f32 = 0.7;
}

/// Kinematic motor defaults
pub mod motor {
    /// Fixed simulation timestep (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Capsule radius
    pub const CAPSULE_RADIUS: f32 = 0.5;

    /// Gap kept between the capsule and obstacles
    pub const SKIN_OFFSET: f32 = 0.02;

    /// Steepest slope still classified as stable ground, in degrees
    pub const MAX_STABLE_SLOPE_DEGREES: f32 = 60.0;

    /// Extra distance below the capsule searched for ground
    pub const GROUND_PROBE_DISTANCE: f32 = 0.15;

    /// Snap-to-ground distance while grounded
    pub const SNAP_TO_GROUND: f32 = 0.2;

    /// Maximum autostep height
    pub const MAX_STEP_HEIGHT: f32 = 0.3;

    /// Minimum autostep width
    pub const MIN_STEP_WIDTH: f32 = 0.05;

    /// Capacity of the stand-up overlap buffer
    pub const OVERLAP_BUFFER_CAPACITY: usize = 8;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 1.0e-5;
}

/// Input shaping defaults
pub mod input {
    /// Radial deadzone applied to the raw move axis
    pub const MOVE_DEADZONE: f32 = 0.1;
}
