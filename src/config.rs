//! Simulation configuration parsing from TOML files

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::character::constants::{body, input, motor, movement, slide};

/// Locomotion tuning consumed by the state machine and body rig
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub walk_speed: f32,
    pub crouch_speed: f32,
    pub walk_response: f32,
    pub crouch_response: f32,
    pub air_speed: f32,
    pub air_acceleration: f32,
    pub jump_speed: f32,
    pub coyote_time: f32,
    /// Fraction of gravity applied while jump is held and rising, in [0, 1]
    pub jump_sustain_gravity: f32,
    pub gravity: f32,
    pub slide_start_speed: f32,
    pub slide_end_speed: f32,
    pub slide_friction: f32,
    pub slide_steer_acceleration: f32,
    pub slide_gravity: f32,
    pub stand_height: f32,
    pub crouch_height: f32,
    pub crouch_height_response: f32,
    /// Camera anchor height as a fraction of capsule height, in [0, 1]
    pub stand_camera_target_height: f32,
    pub crouch_camera_target_height: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: movement::WALK_SPEED,
            crouch_speed: movement::CROUCH_SPEED,
            walk_response: movement::WALK_RESPONSE,
            crouch_response: movement::CROUCH_RESPONSE,
            air_speed: movement::AIR_SPEED,
            air_acceleration: movement::AIR_ACCELERATION,
            jump_speed: movement::JUMP_SPEED,
            coyote_time: movement::COYOTE_TIME,
            jump_sustain_gravity: movement::JUMP_SUSTAIN_GRAVITY,
            gravity: movement::GRAVITY,
            slide_start_speed: slide::START_SPEED,
            slide_end_speed: slide::END_SPEED,
            slide_friction: slide::FRICTION,
            slide_steer_acceleration: slide::STEER_ACCELERATION,
            slide_gravity: slide::GRAVITY,
            stand_height: body::STAND_HEIGHT,
            crouch_height: body::CROUCH_HEIGHT,
            crouch_height_response: body::CROUCH_HEIGHT_RESPONSE,
            stand_camera_target_height: body::STAND_CAMERA_TARGET_HEIGHT,
            crouch_camera_target_height: body::CROUCH_CAMERA_TARGET_HEIGHT,
        }
    }
}

/// Kinematic motor settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub capsule_radius: f32,
    pub skin_offset: f32,
    pub max_stable_slope_degrees: f32,
    pub ground_probe_distance: f32,
    pub snap_to_ground: f32,
    pub max_step_height: f32,
    pub min_step_width: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            capsule_radius: motor::CAPSULE_RADIUS,
            skin_offset: motor::SKIN_OFFSET,
            max_stable_slope_degrees: motor::MAX_STABLE_SLOPE_DEGREES,
            ground_probe_distance: motor::GROUND_PROBE_DISTANCE,
            snap_to_ground: motor::SNAP_TO_GROUND,
            max_step_height: motor::MAX_STEP_HEIGHT,
            min_step_width: motor::MIN_STEP_WIDTH,
        }
    }
}

/// Input shaping settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub move_deadzone: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_deadzone: input::MOVE_DEADZONE,
        }
    }
}

/// Top-level configuration from a simulation TOML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimConfig {
    /// Fixed tick length in seconds
    #[serde(default = "default_timestep")]
    pub timestep: f32,
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub input: InputConfig,
}

fn default_timestep() -> f32 {
    motor::TIMESTEP
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            locomotion: LocomotionConfig::default(),
            motor: MotorConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let config: SimConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("timestep", self.timestep)?;
        self.locomotion.validate()?;
        self.motor.validate()?;

        if self.locomotion.crouch_height < 2.0 * self.motor.capsule_radius {
            return Err(ConfigError::Invalid {
                field: "locomotion.crouch_height",
                reason: format!(
                    "{} is shorter than the capsule diameter {}",
                    self.locomotion.crouch_height,
                    2.0 * self.motor.capsule_radius
                ),
            });
        }

        let deadzone = self.input.move_deadzone;
        if !(0.0..1.0).contains(&deadzone) {
            return Err(ConfigError::Invalid {
                field: "input.move_deadzone",
                reason: format!("{deadzone} is outside [0, 1)"),
            });
        }
        Ok(())
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("walk_speed", self.walk_speed)?;
        non_negative("crouch_speed", self.crouch_speed)?;
        non_negative("walk_response", self.walk_response)?;
        non_negative("crouch_response", self.crouch_response)?;
        non_negative("air_speed", self.air_speed)?;
        non_negative("air_acceleration", self.air_acceleration)?;
        non_negative("jump_speed", self.jump_speed)?;
        non_negative("coyote_time", self.coyote_time)?;
        fraction("jump_sustain_gravity", self.jump_sustain_gravity)?;
        finite("gravity", self.gravity)?;
        non_negative("slide_start_speed", self.slide_start_speed)?;
        non_negative("slide_end_speed", self.slide_end_speed)?;
        non_negative("slide_friction", self.slide_friction)?;
        non_negative("slide_steer_acceleration", self.slide_steer_acceleration)?;
        finite("slide_gravity", self.slide_gravity)?;
        positive("stand_height", self.stand_height)?;
        positive("crouch_height", self.crouch_height)?;
        non_negative("crouch_height_response", self.crouch_height_response)?;
        fraction("stand_camera_target_height", self.stand_camera_target_height)?;
        fraction("crouch_camera_target_height", self.crouch_camera_target_height)?;

        if self.crouch_height >= self.stand_height {
            return Err(ConfigError::Invalid {
                field: "crouch_height",
                reason: format!("{} must be below stand_height {}", self.crouch_height, self.stand_height),
            });
        }
        Ok(())
    }
}

impl MotorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("capsule_radius", self.capsule_radius)?;
        non_negative("skin_offset", self.skin_offset)?;
        non_negative("ground_probe_distance", self.ground_probe_distance)?;
        non_negative("snap_to_ground", self.snap_to_ground)?;
        non_negative("max_step_height", self.max_step_height)?;
        non_negative("min_step_width", self.min_step_width)?;
        if !(0.0..90.0).contains(&self.max_stable_slope_degrees) {
            return Err(ConfigError::Invalid {
                field: "max_stable_slope_degrees",
                reason: format!("{} is outside [0, 90)", self.max_stable_slope_degrees),
            });
        }
        Ok(())
    }

    /// Minimum `normal · up` for a contact to count as stable ground.
    pub fn min_stable_normal_dot(&self) -> f32 {
        self.max_stable_slope_degrees.to_radians().cos()
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not finite"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is negative"),
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be greater than zero"),
        });
    }
    Ok(())
}

fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside [0, 1]"),
        });
    }
    Ok(())
}

/// Errors that can occur when loading simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {}: {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.locomotion.walk_speed, 20.0);
        assert_eq!(config.locomotion.coyote_time, 0.2);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            timestep = 0.02

            [locomotion]
            walk_speed = 6.0
            coyote_time = 0.15

            [motor]
            capsule_radius = 0.4
        "#;
        let config = SimConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.timestep, 0.02);
        assert_eq!(config.locomotion.walk_speed, 6.0);
        assert_eq!(config.locomotion.coyote_time, 0.15);
        assert_eq!(config.locomotion.crouch_speed, 7.0);
        assert_eq!(config.motor.capsule_radius, 0.4);
    }

    #[test]
    fn test_rejects_crouch_taller_than_stand() {
        let toml = r#"
            [locomotion]
            stand_height = 1.5
            crouch_height = 1.8
        "#;
        let err = SimConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "crouch_height", .. }));
    }

    #[test]
    fn test_rejects_fraction_out_of_range() {
        let toml = r#"
            [locomotion]
            jump_sustain_gravity = 1.5
        "#;
        let err = SimConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("jump_sustain_gravity"));
    }

    #[test]
    fn test_rejects_capsule_wider_than_crouch_height() {
        let toml = r#"
            [motor]
            capsule_radius = 0.6
        "#;
        let err = SimConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "locomotion.crouch_height", .. }));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = SimConfig::from_toml_str(include_str!("../demos/stride.toml")).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SimConfig::from_file(Path::new("/nonexistent/stride.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stride.toml"));
    }
}
