//! Deterministic motor double for exercising controllers without a physics world.

use nalgebra::{UnitQuaternion, Vector3};

use crate::character::constants::motor::CAPSULE_RADIUS;
use crate::character::motor::{
    CapsuleDimensions, CharacterController, CharacterMotor, ColliderId, GroundingStatus, LayerMask,
    OverlapBuffer, TriggerInteraction,
};

/// Motor whose ground contact and overlap results are set by the test.
///
/// `run_tick` invokes the controller callbacks in the same order as the rapier
/// pipeline and integrates position with the returned velocity.
#[derive(Debug, Clone)]
pub struct ScriptedMotor {
    pub grounding: GroundingStatus,
    pub up: Vector3<f32>,
    pub capsule: CapsuleDimensions,
    pub velocity: Vector3<f32>,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub collidable_layers: LayerMask,
    /// Number of colliders reported by every overlap query on `obstacle_layers`.
    pub overlap_count: usize,
    pub obstacle_layers: LayerMask,
    pub force_unground_calls: Vec<f32>,
    pub capsule_history: Vec<CapsuleDimensions>,
}

impl ScriptedMotor {
    /// Standing on flat, stable ground.
    pub fn grounded() -> Self {
        let mut motor = Self::airborne();
        motor.set_stable_ground(Vector3::y());
        motor
    }

    /// Falling with nothing below.
    pub fn airborne() -> Self {
        Self {
            grounding: GroundingStatus::default(),
            up: Vector3::y(),
            capsule: CapsuleDimensions::grounded(CAPSULE_RADIUS, 2.0),
            velocity: Vector3::zeros(),
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            collidable_layers: LayerMask::ALL,
            overlap_count: 0,
            obstacle_layers: LayerMask(1),
            force_unground_calls: Vec::new(),
            capsule_history: Vec::new(),
        }
    }

    pub fn set_stable_ground(&mut self, normal: Vector3<f32>) {
        self.grounding = GroundingStatus {
            is_stable_on_ground: true,
            found_any_ground: true,
            ground_normal: normal.normalize(),
        };
    }

    /// Ground detected below but too steep to stand on.
    pub fn set_unstable_ground(&mut self, normal: Vector3<f32>) {
        self.grounding = GroundingStatus {
            is_stable_on_ground: false,
            found_any_ground: true,
            ground_normal: normal.normalize(),
        };
    }

    pub fn set_airborne(&mut self) {
        self.grounding = GroundingStatus::default();
    }

    /// Runs one update of `controller` against this motor.
    pub fn run_tick(&mut self, controller: &mut dyn CharacterController, dt: f32) {
        controller.before_character_update(&mut *self, dt);
        controller.post_grounding_update(&mut *self, dt);

        let mut rotation = self.rotation;
        controller.update_rotation(&mut rotation, &*self, dt);
        self.rotation = rotation;

        let mut velocity = self.velocity;
        controller.update_velocity(&mut velocity, &mut *self, dt);
        self.velocity = velocity;
        self.position += velocity * dt;

        controller.after_character_update(&mut *self, dt);
    }
}

impl CharacterMotor for ScriptedMotor {
    fn grounding_status(&self) -> GroundingStatus {
        self.grounding
    }

    fn character_up(&self) -> Vector3<f32> {
        self.up
    }

    fn capsule(&self) -> CapsuleDimensions {
        self.capsule
    }

    fn base_velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    fn transient_position(&self) -> Vector3<f32> {
        self.position
    }

    fn transient_rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    fn collidable_layers(&self) -> LayerMask {
        self.collidable_layers
    }

    fn set_capsule_dimensions(&mut self, radius: f32, height: f32, y_offset: f32) {
        self.capsule = CapsuleDimensions {
            radius,
            height,
            y_offset,
        };
        self.capsule_history.push(self.capsule);
    }

    fn force_unground(&mut self, time: f32) {
        self.force_unground_calls.push(time);
        self.grounding.is_stable_on_ground = false;
    }

    fn character_overlap(
        &self,
        _position: Vector3<f32>,
        _rotation: UnitQuaternion<f32>,
        results: &mut OverlapBuffer,
        layers: LayerMask,
        _triggers: TriggerInteraction,
    ) -> usize {
        results.clear();
        if layers.0 & self.obstacle_layers.0 == 0 {
            return 0;
        }
        for i in 0..self.overlap_count {
            if !results.push(ColliderId(i as u64)) {
                break;
            }
        }
        results.len()
    }

    fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    fn set_base_velocity(&mut self, velocity: Vector3<f32>) {
        self.velocity = velocity;
    }
}
