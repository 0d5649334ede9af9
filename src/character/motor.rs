//! Boundary between the locomotion state machine and the collision solver.
//!
//! The solver owns the loop. Every tick it calls a [`CharacterController`] in
//! this fixed order:
//!
//! 1. [`CharacterController::before_character_update`]
//! 2. ground probe (solver side)
//! 3. [`CharacterController::post_grounding_update`]
//! 4. [`CharacterController::update_rotation`], then [`CharacterController::update_velocity`]
//! 5. movement and collision resolution (solver side)
//! 6. [`CharacterController::after_character_update`]

use nalgebra::{UnitQuaternion, Vector3};

use super::constants::motor::OVERLAP_BUFFER_CAPACITY;
use super::math::normalize_or_zero;

/// Opaque identifier of a collider owned by the motor's world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(pub u64);

/// Bitmask of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Whether overlap queries report trigger volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerInteraction {
    Ignore,
    Collide,
}

/// Ground classification from the motor's most recent probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundingStatus {
    /// Supportive contact the character can stand on.
    pub is_stable_on_ground: bool,
    /// Any ground below the capsule, including slopes too steep to stand on.
    pub found_any_ground: bool,
    pub ground_normal: Vector3<f32>,
}

impl Default for GroundingStatus {
    fn default() -> Self {
        Self {
            is_stable_on_ground: false,
            found_any_ground: false,
            ground_normal: Vector3::y(),
        }
    }
}

/// Capsule geometry. `y_offset` is the height of the capsule centre above the character origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleDimensions {
    pub radius: f32,
    pub height: f32,
    pub y_offset: f32,
}

impl CapsuleDimensions {
    /// Capsule standing on the character origin.
    pub fn grounded(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            y_offset: height * 0.5,
        }
    }
}

/// Fixed-capacity result buffer for overlap queries, reused across ticks.
#[derive(Debug, Clone)]
pub struct OverlapBuffer {
    hits: [Option<ColliderId>; OVERLAP_BUFFER_CAPACITY],
    len: usize,
}

impl OverlapBuffer {
    pub fn new() -> Self {
        Self {
            hits: [None; OVERLAP_BUFFER_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.hits = [None; OVERLAP_BUFFER_CAPACITY];
        self.len = 0;
    }

    /// Records a hit if there is room. Returns whether more hits can be accepted,
    /// so `false` after storing the last slot still means the hit was kept.
    pub fn push(&mut self, collider: ColliderId) -> bool {
        if self.len >= OVERLAP_BUFFER_CAPACITY {
            return false;
        }
        self.hits[self.len] = Some(collider);
        self.len += 1;
        self.len < OVERLAP_BUFFER_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        OVERLAP_BUFFER_CAPACITY
    }

    pub fn iter(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.hits[..self.len].iter().flatten().copied()
    }
}

impl Default for OverlapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A contact reported by the solver while moving the capsule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterHit {
    pub collider: ColliderId,
    pub normal: Vector3<f32>,
    pub point: Vector3<f32>,
}

/// Stability verdict for a hit; controllers may refine it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitStabilityReport {
    pub is_stable: bool,
}

/// Queries and commands the locomotion code needs from the solver.
pub trait CharacterMotor {
    fn grounding_status(&self) -> GroundingStatus;

    fn character_up(&self) -> Vector3<f32>;

    fn capsule(&self) -> CapsuleDimensions;

    /// Velocity the motor will integrate (the character's own velocity).
    fn base_velocity(&self) -> Vector3<f32>;

    /// Position resolved by the current update.
    fn transient_position(&self) -> Vector3<f32>;

    fn transient_rotation(&self) -> UnitQuaternion<f32>;

    fn collidable_layers(&self) -> LayerMask;

    fn set_capsule_dimensions(&mut self, radius: f32, height: f32, y_offset: f32);

    /// Skips ground snapping and probing for `time` seconds (0 = this update only).
    fn force_unground(&mut self, time: f32);

    /// Fills `results` with colliders overlapping the capsule placed at the given pose.
    fn character_overlap(
        &self,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        results: &mut OverlapBuffer,
        layers: LayerMask,
        triggers: TriggerInteraction,
    ) -> usize;

    fn set_position(&mut self, position: Vector3<f32>);

    fn set_base_velocity(&mut self, velocity: Vector3<f32>);

    /// Redirects `direction` along the surface with the given normal, as a unit vector.
    fn direction_tangent_to_surface(
        &self,
        direction: &Vector3<f32>,
        surface_normal: &Vector3<f32>,
    ) -> Vector3<f32> {
        let right = direction.cross(&self.character_up());
        normalize_or_zero(&surface_normal.cross(&right))
    }
}

/// Callbacks a solver invokes on the character it moves, in the order listed
/// in the module docs.
pub trait CharacterController {
    fn before_character_update(&mut self, motor: &mut dyn CharacterMotor, dt: f32);

    fn post_grounding_update(&mut self, motor: &mut dyn CharacterMotor, dt: f32);

    fn update_rotation(&mut self, rotation: &mut UnitQuaternion<f32>, motor: &dyn CharacterMotor, dt: f32);

    fn update_velocity(&mut self, velocity: &mut Vector3<f32>, motor: &mut dyn CharacterMotor, dt: f32);

    fn after_character_update(&mut self, motor: &mut dyn CharacterMotor, dt: f32);

    fn is_collider_valid_for_collisions(&self, _collider: ColliderId) -> bool {
        true
    }

    fn on_ground_hit(&mut self, _hit: &CharacterHit, _report: &mut HitStabilityReport) {}

    fn on_movement_hit(&mut self, _hit: &CharacterHit, _report: &mut HitStabilityReport) {}

    fn on_discrete_collision_detected(&mut self, _collider: ColliderId) {}

    fn process_hit_stability_report(
        &mut self,
        _hit: &CharacterHit,
        _at_position: Vector3<f32>,
        _at_rotation: UnitQuaternion<f32>,
        _report: &mut HitStabilityReport,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_buffer_is_bounded() {
        let mut buffer = OverlapBuffer::new();
        for i in 0..OVERLAP_BUFFER_CAPACITY as u64 - 1 {
            assert!(buffer.push(ColliderId(i)));
        }
        assert!(!buffer.push(ColliderId(99)), "last slot fills the buffer");
        assert_eq!(buffer.iter().last(), Some(ColliderId(99)), "last slot is still stored");
        assert!(!buffer.push(ColliderId(100)));
        assert_eq!(buffer.len(), OVERLAP_BUFFER_CAPACITY);
        assert!(!buffer.iter().any(|c| c == ColliderId(100)), "rejected once full");

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn test_layer_mask_contains() {
        assert!(LayerMask::ALL.contains(LayerMask(0b10)));
        assert!(!LayerMask(0b01).contains(LayerMask(0b10)));
    }
}
