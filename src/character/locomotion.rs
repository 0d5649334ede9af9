//! First-person locomotion state machine.
//!
//! [`PlayerCharacter`] latches input between ticks and answers the motor's
//! callbacks: it picks the stance, resizes the capsule, computes velocity
//! and yaw, grants or drops jumps, and fires the flashlight.

use nalgebra::{UnitQuaternion, Vector3};

use super::body_rig::BodyRig;
use super::flashlight::{Flashlight, LightToggle};
use super::input::{CharacterInput, RequestLatches};
use super::math::{clamp_magnitude, exp_smooth, normalize_or_zero, project_on_plane};
use super::motor::{CharacterController, CharacterMotor, GroundingStatus, OverlapBuffer, TriggerInteraction};
use super::state::{CharacterState, Stance};
use crate::config::LocomotionConfig;

/// Airborne and jump bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JumpTimers {
    /// Seconds since the last update on stable ground.
    pub time_since_ungrounded: f32,
    /// Seconds a pending jump has waited without being grantable.
    pub time_since_jump_request: f32,
    /// Set when the character left the ground by jumping; blocks coyote re-grants.
    pub ungrounded_due_to_jump: bool,
}

pub struct PlayerCharacter<L: LightToggle = Flashlight> {
    config: LocomotionConfig,
    light: L,
    rig: BodyRig,
    state: CharacterState,
    last_state: CharacterState,
    tick_start_state: CharacterState,
    requests: RequestLatches,
    timers: JumpTimers,
    overlap_results: OverlapBuffer,
}

impl PlayerCharacter<Flashlight> {
    pub fn with_flashlight(config: LocomotionConfig) -> Self {
        Self::new(config, Flashlight::default())
    }
}

impl<L: LightToggle> PlayerCharacter<L> {
    pub fn new(config: LocomotionConfig, light: L) -> Self {
        let state = CharacterState::default();
        Self {
            rig: BodyRig::new(&config),
            config,
            light,
            state,
            last_state: state,
            tick_start_state: state,
            requests: RequestLatches::default(),
            timers: JumpTimers::default(),
            overlap_results: OverlapBuffer::new(),
        }
    }

    /// Resets to a standing character and sizes the motor's capsule to match.
    pub fn initialize(&mut self, motor: &mut dyn CharacterMotor) {
        self.state = CharacterState {
            stance: Stance::Stand,
            grounded: motor.grounding_status().is_stable_on_ground,
            velocity: motor.base_velocity(),
        };
        self.last_state = self.state;
        self.tick_start_state = self.state;
        self.requests = RequestLatches::default();
        self.timers = JumpTimers::default();
        self.overlap_results.clear();

        let radius = motor.capsule().radius;
        let height = self.config.stand_height;
        motor.set_capsule_dimensions(radius, height, height * 0.5);
    }

    /// Latches this frame's input. Call once per tick before the motor runs.
    pub fn update_input(&mut self, input: &CharacterInput) {
        let edges = self.requests.apply(input, self.state.grounded);
        if edges.jump_started {
            self.timers.time_since_jump_request = 0.0;
        }
    }

    /// Moves the cosmetic rig toward the current capsule height.
    pub fn update_body(&mut self, motor: &dyn CharacterMotor, dt: f32) {
        self.rig.update(motor.capsule().height, self.state.stance, &self.config, dt);
    }

    /// Teleports the character, optionally discarding its velocity.
    pub fn set_position(&mut self, motor: &mut dyn CharacterMotor, position: Vector3<f32>, kill_velocity: bool) {
        motor.set_position(position);
        if kill_velocity {
            motor.set_base_velocity(Vector3::zeros());
        }
    }

    pub fn camera_target(&self) -> Vector3<f32> {
        self.rig.camera_anchor
    }

    pub fn body_rig(&self) -> &BodyRig {
        &self.rig
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// State captured at the start of the previous completed update.
    pub fn last_state(&self) -> &CharacterState {
        &self.last_state
    }

    pub fn requests(&self) -> &RequestLatches {
        &self.requests
    }

    pub fn timers(&self) -> &JumpTimers {
        &self.timers
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn light(&self) -> &L {
        &self.light
    }

    fn set_stance(&mut self, stance: Stance) {
        if self.state.stance != stance {
            log::debug!("stance {:?} -> {:?}", self.state.stance, stance);
            self.state.stance = stance;
        }
    }

    fn resize_capsule(&self, motor: &mut dyn CharacterMotor, height: f32) {
        let radius = motor.capsule().radius;
        motor.set_capsule_dimensions(radius, height, height * 0.5);
    }

    fn update_grounded_velocity(
        &mut self,
        velocity: &mut Vector3<f32>,
        motor: &dyn CharacterMotor,
        ground: &GroundingStatus,
        up: &Vector3<f32>,
        dt: f32,
    ) {
        self.timers.time_since_ungrounded = 0.0;
        self.timers.ungrounded_due_to_jump = false;

        let normal = ground.ground_normal;
        let requested = self.requests.movement;
        let grounded_movement = motor.direction_tangent_to_surface(&requested, &normal) * requested.norm();

        let moving = grounded_movement.norm_squared() > 0.0;
        let crouching = self.state.stance == Stance::Crouch;
        let was_standing = self.last_state.stance == Stance::Stand;
        let was_in_air = !self.last_state.grounded;

        let mut slide_started = false;
        if moving && crouching && (was_standing || was_in_air) {
            self.set_stance(Stance::Slide);
            slide_started = true;

            if was_in_air {
                *velocity = project_on_plane(&self.last_state.velocity, &normal);
                // A landing spends the crouch-in-air latch.
                self.requests.crouch_in_air = false;
            }

            let slide_speed = self.config.slide_start_speed.max(velocity.norm());
            let mut direction = motor.direction_tangent_to_surface(velocity, &normal);
            if direction.norm_squared() == 0.0 {
                direction = normalize_or_zero(&grounded_movement);
            }
            *velocity = direction * slide_speed;
        }

        match self.state.stance {
            Stance::Stand | Stance::Crouch => {
                let (speed, response) = if self.state.stance == Stance::Stand {
                    (self.config.walk_speed, self.config.walk_response)
                } else {
                    (self.config.crouch_speed, self.config.crouch_response)
                };
                let target = grounded_movement * speed;
                *velocity = exp_smooth(velocity, &target, response, dt);
            }
            Stance::Slide if !slide_started => {
                *velocity -= *velocity * (self.config.slide_friction * dt);

                let slope_force = project_on_plane(&-up, &normal) * self.config.slide_gravity;
                *velocity -= slope_force * dt;

                let current_speed = velocity.norm();
                let target = grounded_movement * current_speed;
                let steer = (target - *velocity) * (self.config.slide_steer_acceleration * dt);
                *velocity = clamp_magnitude(&(*velocity + steer), current_speed);

                if velocity.norm() < self.config.slide_end_speed {
                    self.set_stance(Stance::Crouch);
                }
            }
            Stance::Slide | Stance::Wallrun | Stance::RailGrind => {}
        }
    }

    fn update_air_velocity(
        &mut self,
        velocity: &mut Vector3<f32>,
        ground: &GroundingStatus,
        up: &Vector3<f32>,
        dt: f32,
    ) {
        self.timers.time_since_ungrounded += dt;

        let requested = self.requests.movement;
        if requested.norm_squared() > 0.0 {
            let planar_movement = project_on_plane(&requested, up) * requested.norm();
            let current_planar = project_on_plane(velocity, up);
            let current_planar_speed = current_planar.norm();
            let mut movement_force = planar_movement * (self.config.air_acceleration * dt);

            if current_planar_speed < self.config.air_speed {
                let target_planar = clamp_magnitude(&(current_planar + movement_force), self.config.air_speed);
                movement_force = target_planar - current_planar;
            } else if current_planar.dot(&movement_force) > 0.0 {
                movement_force = project_on_plane(&movement_force, &current_planar);
            }

            if ground.found_any_ground && movement_force.dot(&(*velocity + movement_force)) > 0.0 {
                let obstruction_normal = normalize_or_zero(&up.cross(&up.cross(&ground.ground_normal)));
                movement_force = project_on_plane(&movement_force, &obstruction_normal);
            }

            *velocity += movement_force;

            // Air control may turn the planar velocity but never push it past the cap.
            let planar_limit = current_planar_speed.max(self.config.air_speed);
            let planar = project_on_plane(velocity, up);
            *velocity = (*velocity - planar) + clamp_magnitude(&planar, planar_limit);
        }

        let mut gravity = self.config.gravity;
        if self.requests.jump_sustain && velocity.dot(up) > 0.0 {
            gravity *= self.config.jump_sustain_gravity;
        }
        *velocity += up * (gravity * dt);
    }

    fn resolve_jump(
        &mut self,
        velocity: &mut Vector3<f32>,
        motor: &mut dyn CharacterMotor,
        grounded: bool,
        up: &Vector3<f32>,
        dt: f32,
    ) {
        if !self.requests.jump {
            return;
        }

        let can_coyote_jump =
            self.timers.time_since_ungrounded < self.config.coyote_time && !self.timers.ungrounded_due_to_jump;

        if grounded || can_coyote_jump {
            self.requests.jump = false;
            self.requests.crouch = false;
            self.requests.crouch_in_air = false;

            motor.force_unground(0.0);
            self.timers.ungrounded_due_to_jump = true;

            let current_vertical = velocity.dot(up);
            let target_vertical = current_vertical.max(self.config.jump_speed);
            *velocity += up * (target_vertical - current_vertical);
            log::debug!(
                "jump granted (grounded={}, airborne for {:.3}s)",
                grounded,
                self.timers.time_since_ungrounded
            );
        } else {
            self.timers.time_since_jump_request += dt;
            self.requests.jump = self.timers.time_since_jump_request < self.config.coyote_time;
            if !self.requests.jump {
                log::debug!(
                    "jump request dropped after {:.3}s",
                    self.timers.time_since_jump_request
                );
            }
        }
    }
}

impl<L: LightToggle> CharacterController for PlayerCharacter<L> {
    fn before_character_update(&mut self, motor: &mut dyn CharacterMotor, _dt: f32) {
        self.tick_start_state = self.state;

        if self.requests.crouch && self.state.stance == Stance::Stand {
            self.set_stance(Stance::Crouch);
            self.resize_capsule(motor, self.config.crouch_height);
        }
    }

    fn post_grounding_update(&mut self, motor: &mut dyn CharacterMotor, _dt: f32) {
        if !motor.grounding_status().is_stable_on_ground && self.state.stance == Stance::Slide {
            self.set_stance(Stance::Crouch);
        }
    }

    fn update_rotation(&mut self, rotation: &mut UnitQuaternion<f32>, motor: &dyn CharacterMotor, _dt: f32) {
        let up = motor.character_up();
        let look = self.requests.rotation * Vector3::z();
        let forward = project_on_plane(&look, &up);
        if let Some(forward) = forward.try_normalize(0.0) {
            *rotation = UnitQuaternion::face_towards(&forward, &up);
        }
    }

    fn update_velocity(&mut self, velocity: &mut Vector3<f32>, motor: &mut dyn CharacterMotor, dt: f32) {
        let ground = motor.grounding_status();
        let up = motor.character_up();

        if ground.is_stable_on_ground {
            self.update_grounded_velocity(velocity, &*motor, &ground, &up, dt);
        } else {
            self.update_air_velocity(velocity, &ground, &up, dt);
        }

        self.resolve_jump(velocity, motor, ground.is_stable_on_ground, &up, dt);

        if self.requests.flashlight {
            self.requests.flashlight = false;
            self.light.toggle();
        }
    }

    fn after_character_update(&mut self, motor: &mut dyn CharacterMotor, _dt: f32) {
        if !self.requests.crouch && self.state.stance != Stance::Stand {
            self.resize_capsule(motor, self.config.stand_height);

            let position = motor.transient_position();
            let rotation = motor.transient_rotation();
            let layers = motor.collidable_layers();
            self.overlap_results.clear();
            let overlaps = motor.character_overlap(
                position,
                rotation,
                &mut self.overlap_results,
                layers,
                TriggerInteraction::Ignore,
            );

            if overlaps > 0 {
                log::debug!("stand-up blocked by {} collider(s); staying crouched", overlaps);
                self.requests.crouch = true;
                self.resize_capsule(motor, self.config.crouch_height);
            } else {
                self.set_stance(Stance::Stand);
            }
        }

        self.state.grounded = motor.grounding_status().is_stable_on_ground;
        self.state.velocity = motor.base_velocity();
        self.last_state = self.tick_start_state;
    }
}
