use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use std::collections::HashMap;

use super::{capsule_isometry, capsule_shape, collider_id, CharacterBody, GROUP_CHARACTER};
use crate::character::constants::motor::EPSILON;
use crate::character::math::normalize_or_zero;
use crate::character::motor::{
    CapsuleDimensions, CharacterController, CharacterHit, CharacterMotor, GroundingStatus, LayerMask,
    OverlapBuffer, TriggerInteraction,
};
use crate::config::MotorConfig;

/// [`CharacterMotor`] backed by a rapier kinematic body.
///
/// Borrows the world's sets for one update; create it with [`super::PhysicsWorld::motor`].
pub struct RapierMotor<'w> {
    bodies: &'w mut RigidBodySet,
    colliders: &'w mut ColliderSet,
    query_pipeline: &'w QueryPipeline,
    collider_to_part: &'w HashMap<ColliderHandle, u64>,
    config: &'w MotorConfig,
    character: &'w mut CharacterBody,
}

fn query_groups(layers: LayerMask) -> InteractionGroups {
    InteractionGroups::new(GROUP_CHARACTER, Group::from_bits_truncate(layers.0))
}

impl<'w> RapierMotor<'w> {
    pub(super) fn new(
        bodies: &'w mut RigidBodySet,
        colliders: &'w mut ColliderSet,
        query_pipeline: &'w QueryPipeline,
        collider_to_part: &'w HashMap<ColliderHandle, u64>,
        config: &'w MotorConfig,
        character: &'w mut CharacterBody,
    ) -> Self {
        Self {
            bodies,
            colliders,
            query_pipeline,
            collider_to_part,
            config,
            character,
        }
    }

    pub fn set_transient_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.character.rotation = rotation;
    }

    pub fn ground_hit(&self) -> Option<CharacterHit> {
        self.character.ground_hit
    }

    pub(super) fn take_hits(&mut self) -> Vec<CharacterHit> {
        std::mem::take(&mut self.character.hits)
    }

    pub(super) fn restore_hits(&mut self, hits: Vec<CharacterHit>) {
        self.character.hits = hits;
    }

    pub(super) fn is_stable_normal(&self, normal: &Vector3<f32>) -> bool {
        normal.dot(&self.character_up()) >= self.config.min_stable_normal_dot()
    }

    /// Classifies the ground under the capsule.
    ///
    /// Casts a ray down from the bottom sphere centre. The hit is close enough
    /// when the gap between sphere and surface, measured along the ray, stays
    /// within skin offset plus probe distance.
    pub(super) fn probe_ground(&mut self, dt: f32) {
        let up = self.character_up();
        let character = &mut *self.character;
        character.ground_hit = None;

        if character.must_unground() {
            character.grounding = GroundingStatus::default();
            character.must_unground = false;
            character.must_unground_time = (character.must_unground_time - dt).max(0.0);
            return;
        }

        let radius = character.capsule.radius;
        let reach = self.config.skin_offset + self.config.ground_probe_distance;
        let origin = character.position + up * radius;
        let ray = Ray::new(Point::from(origin), -up);
        let filter = QueryFilter::default()
            .exclude_rigid_body(character.body_handle)
            .exclude_sensors()
            .groups(query_groups(character.collidable_layers));

        let hit = self.query_pipeline.cast_ray_and_get_normal(
            &*self.bodies,
            &*self.colliders,
            &ray,
            radius * 3.0 + reach,
            true,
            filter,
        );

        let Some((handle, intersection)) = hit else {
            character.grounding = GroundingStatus::default();
            return;
        };

        let mut normal = normalize_or_zero(&intersection.normal);
        if normal == Vector3::zeros() {
            // Ray started inside the collider.
            normal = up;
        }
        let cos = normal.dot(&up).max(EPSILON);
        let gap = intersection.time_of_impact - radius / cos;
        if gap > reach {
            character.grounding = GroundingStatus::default();
            return;
        }

        character.grounding = GroundingStatus {
            is_stable_on_ground: cos >= self.config.min_stable_normal_dot(),
            found_any_ground: true,
            ground_normal: normal,
        };
        character.ground_hit = Some(CharacterHit {
            collider: collider_id(self.collider_to_part, handle),
            normal,
            point: ray.point_at(intersection.time_of_impact).coords,
        });
    }

    /// Sweeps the capsule by `velocity * dt`, collecting hits into the body's reusable hit list.
    /// Returns the translation actually applied.
    pub(super) fn move_character(
        &mut self,
        velocity: Vector3<f32>,
        dt: f32,
        controller: &dyn CharacterController,
    ) -> Option<Vector3<f32>> {
        let character = &mut *self.character;
        let collider = self.colliders.get(character.collider_handle)?;
        let shape = collider.shape();
        let current_pos = capsule_isometry(character.position, character.rotation, character.capsule.y_offset);

        let snap_to_ground = if character.must_unground() || !character.grounding.is_stable_on_ground {
            None
        } else {
            Some(CharacterLength::Absolute(self.config.snap_to_ground))
        };
        let max_slope = self.config.max_stable_slope_degrees.to_radians();
        let kinematic = KinematicCharacterController {
            offset: CharacterLength::Absolute(self.config.skin_offset),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.config.max_step_height),
                min_width: CharacterLength::Absolute(self.config.min_step_width),
                include_dynamic_bodies: false,
            }),
            max_slope_climb_angle: max_slope,
            min_slope_slide_angle: max_slope,
            snap_to_ground,
            ..Default::default()
        };

        let collider_to_part = self.collider_to_part;
        let predicate = |handle: ColliderHandle, _: &Collider| {
            controller.is_collider_valid_for_collisions(collider_id(collider_to_part, handle))
        };
        let filter = QueryFilter::default()
            .exclude_rigid_body(character.body_handle)
            .exclude_sensors()
            .groups(query_groups(character.collidable_layers))
            .predicate(&predicate);

        let mut hits = std::mem::take(&mut character.hits);
        hits.clear();
        let movement = kinematic.move_shape(
            dt,
            &*self.bodies,
            &*self.colliders,
            self.query_pipeline,
            shape,
            &current_pos,
            velocity * dt,
            filter,
            |collision| {
                hits.push(CharacterHit {
                    collider: collider_id(collider_to_part, collision.handle),
                    normal: -*collision.hit.normal1,
                    point: collision.character_pos.translation.vector,
                });
            },
        );
        character.hits = hits;

        character.position += movement.translation;
        character.base_velocity = if dt > EPSILON {
            movement.translation / dt
        } else {
            velocity
        };
        if character.must_unground() {
            character.grounding.is_stable_on_ground = false;
        }

        let body = self.bodies.get_mut(character.body_handle)?;
        body.set_next_kinematic_translation(character.position);
        body.set_next_kinematic_rotation(character.rotation);
        Some(movement.translation)
    }
}

impl CharacterMotor for RapierMotor<'_> {
    fn grounding_status(&self) -> GroundingStatus {
        self.character.grounding
    }

    fn character_up(&self) -> Vector3<f32> {
        self.character.rotation * Vector3::y()
    }

    fn capsule(&self) -> CapsuleDimensions {
        self.character.capsule
    }

    fn base_velocity(&self) -> Vector3<f32> {
        self.character.base_velocity
    }

    fn transient_position(&self) -> Vector3<f32> {
        self.character.position
    }

    fn transient_rotation(&self) -> UnitQuaternion<f32> {
        self.character.rotation
    }

    fn collidable_layers(&self) -> LayerMask {
        self.character.collidable_layers
    }

    fn set_capsule_dimensions(&mut self, radius: f32, height: f32, y_offset: f32) {
        self.character.capsule = CapsuleDimensions {
            radius,
            height,
            y_offset,
        };
        if let Some(collider) = self.colliders.get_mut(self.character.collider_handle) {
            collider.set_shape(capsule_shape(radius, height));
            collider.set_translation_wrt_parent(vector![0.0, y_offset, 0.0]);
        }
    }

    fn force_unground(&mut self, time: f32) {
        self.character.must_unground = true;
        self.character.must_unground_time = time.max(0.0);
        self.character.grounding.is_stable_on_ground = false;
    }

    fn character_overlap(
        &self,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        results: &mut OverlapBuffer,
        layers: LayerMask,
        triggers: TriggerInteraction,
    ) -> usize {
        results.clear();
        let Some(collider) = self.colliders.get(self.character.collider_handle) else {
            return 0;
        };
        let shape_pos = capsule_isometry(position, rotation, self.character.capsule.y_offset);
        let mut filter = QueryFilter::default()
            .exclude_rigid_body(self.character.body_handle)
            .groups(query_groups(layers));
        if triggers == TriggerInteraction::Ignore {
            filter = filter.exclude_sensors();
        }

        self.query_pipeline.intersections_with_shape(
            &*self.bodies,
            &*self.colliders,
            &shape_pos,
            collider.shape(),
            filter,
            |handle| results.push(collider_id(self.collider_to_part, handle)),
        );
        results.len()
    }

    fn set_position(&mut self, position: Vector3<f32>) {
        self.character.position = position;
        if let Some(body) = self.bodies.get_mut(self.character.body_handle) {
            body.set_translation(position, true);
        }
    }

    fn set_base_velocity(&mut self, velocity: Vector3<f32>) {
        self.character.base_velocity = velocity;
    }
}
