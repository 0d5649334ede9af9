use nalgebra::Vector3;

use super::math::exp_smooth;
use super::state::Stance;
use crate::config::LocomotionConfig;

/// Cosmetic camera anchor and body scale that trail the capsule height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRig {
    /// Camera anchor position relative to the character origin.
    pub camera_anchor: Vector3<f32>,
    /// Visual scale of the body root.
    pub root_scale: Vector3<f32>,
}

impl BodyRig {
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            camera_anchor: Vector3::new(0.0, config.stand_height * config.stand_camera_target_height, 0.0),
            root_scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Blends toward the targets implied by `capsule_height` and `stance`.
    pub fn update(&mut self, capsule_height: f32, stance: Stance, config: &LocomotionConfig, dt: f32) {
        let normalized_height = capsule_height / config.stand_height;
        let camera_fraction = if stance.is_lowered() {
            config.crouch_camera_target_height
        } else {
            config.stand_camera_target_height
        };
        let camera_target = Vector3::new(0.0, capsule_height * camera_fraction, 0.0);
        let scale_target = Vector3::new(1.0, normalized_height, 1.0);

        self.camera_anchor = exp_smooth(&self.camera_anchor, &camera_target, config.crouch_height_response, dt);
        self.root_scale = exp_smooth(&self.root_scale, &scale_target, config.crouch_height_response, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rig_converges_to_crouch_targets() {
        let config = LocomotionConfig::default();
        let mut rig = BodyRig::new(&config);
        for _ in 0..200 {
            rig.update(config.crouch_height, Stance::Crouch, &config, 1.0 / 60.0);
        }
        let expected_camera = config.crouch_height * config.crouch_camera_target_height;
        assert!((rig.camera_anchor.y - expected_camera).abs() < 1.0e-3);
        assert!((rig.root_scale.y - config.crouch_height / config.stand_height).abs() < 1.0e-3);
    }

    #[test]
    fn test_lowered_stances_share_crouch_camera_fraction() {
        let config = LocomotionConfig::default();
        let settled = |stance: Stance| {
            let mut rig = BodyRig::new(&config);
            for _ in 0..200 {
                rig.update(config.stand_height, stance, &config, 1.0 / 60.0);
            }
            rig.camera_anchor.y
        };
        let stand = settled(Stance::Stand);
        assert!((stand - config.stand_height * config.stand_camera_target_height).abs() < 1.0e-3);
        for stance in [Stance::Crouch, Stance::Slide, Stance::Wallrun, Stance::RailGrind] {
            let lowered = settled(stance);
            assert!((lowered - config.stand_height * config.crouch_camera_target_height).abs() < 1.0e-3);
        }
    }

    #[test]
    fn test_rig_moves_monotonically() {
        let config = LocomotionConfig::default();
        let mut rig = BodyRig::new(&config);
        let mut last = rig.camera_anchor.y;
        for _ in 0..10 {
            rig.update(config.crouch_height, Stance::Slide, &config, 1.0 / 60.0);
            assert!(rig.camera_anchor.y <= last);
            last = rig.camera_anchor.y;
        }
    }
}
