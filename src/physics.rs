use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use std::collections::HashMap;

use crate::character::motor::{CapsuleDimensions, CharacterHit, ColliderId, GroundingStatus, LayerMask};
use crate::config::MotorConfig;

mod kinematic_motor;
pub mod tick_pipeline;

pub use kinematic_motor::RapierMotor;
pub use tick_pipeline::simulate_character;

// Characters don't collide with each other, only with level geometry.
pub const GROUP_STATIC: Group = Group::GROUP_1;
pub const GROUP_CHARACTER: Group = Group::GROUP_2;

/// Layer mask covering level geometry.
pub fn static_layers() -> LayerMask {
    LayerMask(GROUP_STATIC.bits())
}

/// Per-character motor state kept alongside its rapier body.
pub struct CharacterBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub capsule: CapsuleDimensions,
    /// Bottom of the capsule.
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub base_velocity: Vector3<f32>,
    pub grounding: GroundingStatus,
    pub ground_hit: Option<CharacterHit>,
    pub collidable_layers: LayerMask,
    pub(crate) must_unground: bool,
    pub(crate) must_unground_time: f32,
    /// Movement hits of the last update; capacity is reused between ticks.
    pub(crate) hits: Vec<CharacterHit>,
}

impl CharacterBody {
    pub fn must_unground(&self) -> bool {
        self.must_unground || self.must_unground_time > 0.0
    }
}

/// Wrapper around a rapier3d pipeline holding level geometry and kinematic characters.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    pub motor_config: MotorConfig,

    /// Maps part ID to its rigid body
    pub part_to_body: HashMap<u64, RigidBodyHandle>,
    /// Maps collider handle to the owning part or character ID
    pub collider_to_part: HashMap<ColliderHandle, u64>,
    /// Characters driven through [`RapierMotor`]
    pub characters: HashMap<u64, CharacterBody>,
}

/// Isometry of a capsule collider whose origin sits `y_offset` below its centre.
pub(crate) fn capsule_isometry(
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
    y_offset: f32,
) -> Isometry3<f32> {
    let centre = position + rotation * Vector3::new(0.0, y_offset, 0.0);
    Isometry3::from_parts(Translation3::from(centre), rotation)
}

pub(crate) fn capsule_shape(radius: f32, height: f32) -> SharedShape {
    let half_height = (height - 2.0 * radius).max(0.0) / 2.0;
    SharedShape::capsule_y(half_height, radius)
}

/// Stable identifier for a collider: its part ID when known, else the raw handle.
pub(crate) fn collider_id(collider_to_part: &HashMap<ColliderHandle, u64>, handle: ColliderHandle) -> ColliderId {
    match collider_to_part.get(&handle) {
        Some(&part) => ColliderId(part),
        None => {
            let (index, generation) = handle.into_raw_parts();
            ColliderId((u64::from(generation) << 32) | u64::from(index))
        }
    }
}

impl PhysicsWorld {
    pub fn new(motor_config: MotorConfig) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            motor_config,
            part_to_body: HashMap::new(),
            collider_to_part: HashMap::new(),
            characters: HashMap::new(),
        }
    }

    /// Steps the pipeline, committing kinematic moves and refreshing the query pipeline
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        // Only fixed and kinematic bodies live here, so gravity has nothing to act on.
        self.physics_pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Adds a fixed box of full extents `size` to the level.
    /// Non-solid blocks become triggers: they report overlaps but never block.
    pub fn add_block(
        &mut self,
        part_id: u64,
        position: [f32; 3],
        rotation: UnitQuaternion<f32>,
        size: [f32; 3],
        solid: bool,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![position[0], position[1], position[2]])
            .rotation(rotation.scaled_axis())
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0)
            .sensor(!solid)
            .collision_groups(InteractionGroups::new(GROUP_STATIC, Group::ALL))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.part_to_body.insert(part_id, handle);
        self.collider_to_part.insert(collider_handle, part_id);
        handle
    }

    /// Removes a block from the level
    pub fn remove_block(&mut self, part_id: u64) -> bool {
        let Some(handle) = self.part_to_body.remove(&part_id) else {
            return false;
        };
        if let Some(body) = self.rigid_body_set.get(handle) {
            for ch in body.colliders() {
                self.collider_to_part.remove(ch);
            }
        }
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    /// Adds a kinematic capsule character whose bottom rests at `position`
    pub fn add_character(&mut self, id: u64, position: [f32; 3], height: f32) -> RigidBodyHandle {
        let radius = self.motor_config.capsule_radius;
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let capsule = CapsuleDimensions::grounded(radius, height);
        let collider = ColliderBuilder::new(capsule_shape(radius, height))
            .translation(vector![0.0, capsule.y_offset, 0.0])
            .collision_groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_STATIC))
            .build();
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.collider_to_part.insert(collider_handle, id);
        self.characters.insert(
            id,
            CharacterBody {
                body_handle,
                collider_handle,
                capsule,
                position: Vector3::new(position[0], position[1], position[2]),
                rotation: UnitQuaternion::identity(),
                base_velocity: Vector3::zeros(),
                grounding: GroundingStatus::default(),
                ground_hit: None,
                collidable_layers: static_layers(),
                must_unground: false,
                must_unground_time: 0.0,
                hits: Vec::new(),
            },
        );
        body_handle
    }

    /// Removes a character and its body
    pub fn remove_character(&mut self, id: u64) -> bool {
        let Some(character) = self.characters.remove(&id) else {
            return false;
        };
        self.collider_to_part.remove(&character.collider_handle);
        self.rigid_body_set.remove(
            character.body_handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    pub fn character(&self, id: u64) -> Option<&CharacterBody> {
        self.characters.get(&id)
    }

    /// Motor view over one character, borrowing the world for the duration of an update
    pub fn motor(&mut self, id: u64) -> Option<RapierMotor<'_>> {
        let character = self.characters.get_mut(&id)?;
        Some(RapierMotor::new(
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &self.query_pipeline,
            &self.collider_to_part,
            &self.motor_config,
            character,
        ))
    }

    /// Casts a ray downward and returns (distance, hit_y) if level geometry is found
    pub fn raycast_down(&self, origin: [f32; 3], max_distance: f32) -> Option<(f32, f32)> {
        let ray = Ray::new(point![origin[0], origin[1], origin[2]], vector![0.0, -1.0, 0.0]);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_CHARACTER, GROUP_STATIC));

        self.query_pipeline
            .cast_ray(&self.rigid_body_set, &self.collider_set, &ray, max_distance, true, filter)
            .map(|(_, toi)| (toi, ray.point_at(toi).y))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(MotorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(world: &mut PhysicsWorld) {
        world.add_block(1, [0.0, -0.5, 0.0], UnitQuaternion::identity(), [100.0, 1.0, 100.0], true);
    }

    #[test]
    fn test_raycast_finds_floor_top() {
        let mut world = PhysicsWorld::default();
        floor(&mut world);
        world.step(1.0 / 60.0);
        world.query_pipeline.update(&world.collider_set);

        let (distance, ground_y) = world.raycast_down([0.0, 5.0, 0.0], 10.0).expect("floor below");
        assert!((distance - 5.0).abs() < 1.0e-3);
        assert!(ground_y.abs() < 1.0e-3);
    }

    #[test]
    fn test_remove_block() {
        let mut world = PhysicsWorld::default();
        floor(&mut world);
        assert!(world.remove_block(1));
        assert!(!world.remove_block(1));
        assert!(world.collider_to_part.is_empty());
    }

    #[test]
    fn test_add_and_remove_character() {
        let mut world = PhysicsWorld::default();
        world.add_character(7, [0.0, 0.0, 0.0], 2.0);
        let character = world.character(7).expect("registered");
        assert_eq!(character.capsule.height, 2.0);
        assert_eq!(character.capsule.y_offset, 1.0);
        assert!(world.motor(7).is_some());

        assert!(world.remove_character(7));
        assert!(world.motor(7).is_none());
    }

    #[test]
    fn test_collider_id_prefers_part_id() {
        let mut world = PhysicsWorld::default();
        world.add_block(42, [0.0, 0.0, 0.0], UnitQuaternion::identity(), [1.0, 1.0, 1.0], true);
        let (&handle, _) = world.collider_to_part.iter().next().expect("one collider");
        assert_eq!(collider_id(&world.collider_to_part, handle), ColliderId(42));
    }
}
