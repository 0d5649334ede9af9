use nalgebra::Vector3;

use super::PhysicsWorld;
use crate::character::motor::{
    CharacterController, CharacterMotor, HitStabilityReport, OverlapBuffer, TriggerInteraction,
};

/// Runs one update of `controller` on character `id`, then steps the world.
///
/// Phases, in order:
/// before update -> ground probe -> post grounding -> rotation -> velocity
/// -> sweep and hit callbacks -> after update -> trigger overlaps -> physics step.
///
/// Returns the translation applied, or `None` if the character is unknown.
pub fn simulate_character(
    world: &mut PhysicsWorld,
    id: u64,
    controller: &mut dyn CharacterController,
    dt: f32,
) -> Option<Vector3<f32>> {
    // Update query pipeline before character movement so the sweep sees current geometry.
    world.query_pipeline.update(&world.collider_set);

    let mut motor = world.motor(id)?;
    controller.before_character_update(&mut motor, dt);

    motor.probe_ground(dt);
    if let Some(hit) = motor.ground_hit() {
        let mut report = HitStabilityReport {
            is_stable: motor.grounding_status().is_stable_on_ground,
        };
        controller.on_ground_hit(&hit, &mut report);
    }
    controller.post_grounding_update(&mut motor, dt);

    let mut rotation = motor.transient_rotation();
    controller.update_rotation(&mut rotation, &motor, dt);
    motor.set_transient_rotation(rotation);

    let mut velocity = motor.base_velocity();
    controller.update_velocity(&mut velocity, &mut motor, dt);

    let translation = motor.move_character(velocity, dt, &*controller)?;
    let hits = motor.take_hits();
    let position = motor.transient_position();
    for hit in &hits {
        let mut report = HitStabilityReport {
            is_stable: motor.is_stable_normal(&hit.normal),
        };
        controller.process_hit_stability_report(hit, position, rotation, &mut report);
        controller.on_movement_hit(hit, &mut report);
    }
    motor.restore_hits(hits);

    controller.after_character_update(&mut motor, dt);

    // Discrete pass at the final pose so trigger volumes are reported too.
    let mut overlaps = OverlapBuffer::new();
    let layers = motor.collidable_layers();
    motor.character_overlap(
        motor.transient_position(),
        motor.transient_rotation(),
        &mut overlaps,
        layers,
        TriggerInteraction::Collide,
    );
    for collider in overlaps.iter() {
        controller.on_discrete_collision_detected(collider);
    }

    log::trace!(
        "character {} moved {:?} grounded={}",
        id,
        translation,
        motor.grounding_status().is_stable_on_ground
    );

    world.step(dt);
    Some(translation)
}
