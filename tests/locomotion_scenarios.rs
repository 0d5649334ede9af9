use nalgebra::{Vector2, Vector3};

use stride::character::{CharacterInput, CrouchInput, PlayerCharacter, Stance};
use stride::config::LocomotionConfig;
use stride::testing::ScriptedMotor;

const DT: f32 = 1.0 / 60.0;

fn player_with(config: LocomotionConfig) -> (PlayerCharacter, ScriptedMotor) {
    let mut motor = ScriptedMotor::grounded();
    let mut player = PlayerCharacter::with_flashlight(config);
    player.initialize(&mut motor);
    (player, motor)
}

fn forward() -> CharacterInput {
    CharacterInput {
        move_axis: Vector2::new(0.0, 1.0),
        ..CharacterInput::default()
    }
}

fn jump() -> CharacterInput {
    CharacterInput {
        jump: true,
        ..CharacterInput::default()
    }
}

fn toggle_crouch(input: CharacterInput) -> CharacterInput {
    CharacterInput {
        crouch: CrouchInput::Toggle,
        ..input
    }
}

fn planar_speed(v: &Vector3<f32>) -> f32 {
    Vector3::new(v.x, 0.0, v.z).norm()
}

#[test]
fn test_walk_speed_rises_monotonically_to_top_speed() {
    let config = LocomotionConfig {
        walk_speed: 6.0,
        walk_response: 25.0,
        ..LocomotionConfig::default()
    };
    let (mut player, mut motor) = player_with(config);

    let mut previous = 0.0;
    for _ in 0..20 {
        player.update_input(&forward());
        motor.run_tick(&mut player, 0.1);
        let speed = motor.velocity.norm();
        assert!(speed >= previous - 1.0e-5, "speed dropped: {previous} -> {speed}");
        assert!(speed <= 6.0 + 1.0e-4, "overshot: {speed}");
        previous = speed;
    }
    assert!(previous > 5.9);
}

#[test]
fn test_coyote_jump_granted_shortly_after_leaving_ground() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    motor.run_tick(&mut player, 0.05);

    motor.set_airborne();
    player.update_input(&jump());
    motor.run_tick(&mut player, 0.05);

    assert_eq!(motor.force_unground_calls.len(), 1);
    assert!((motor.velocity.y - player.config().jump_speed).abs() < 1.0e-4);
    assert!(player.timers().ungrounded_due_to_jump);
}

#[test]
fn test_coyote_jump_denied_after_window_and_request_expires() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    motor.run_tick(&mut player, 0.05);

    motor.set_airborne();
    for _ in 0..4 {
        player.update_input(&CharacterInput::default());
        motor.run_tick(&mut player, 0.05);
    }

    player.update_input(&jump());
    motor.run_tick(&mut player, 0.05);
    assert!(motor.force_unground_calls.is_empty(), "airborne for 0.25s");
    assert!((player.timers().time_since_jump_request - 0.05).abs() < 1.0e-5);
    assert!(player.requests().jump, "request is buffered for the coyote window");

    for _ in 0..5 {
        player.update_input(&CharacterInput::default());
        motor.run_tick(&mut player, 0.05);
    }
    assert!(!player.requests().jump);
    assert!(motor.force_unground_calls.is_empty());
}

#[test]
fn test_blocked_stand_keeps_crouch_and_relatches() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    player.update_input(&toggle_crouch(CharacterInput::default()));
    motor.run_tick(&mut player, DT);
    assert_eq!(player.state().stance, Stance::Crouch);

    motor.overlap_count = 1;
    player.update_input(&toggle_crouch(CharacterInput::default()));
    assert!(!player.requests().crouch);
    motor.run_tick(&mut player, DT);

    assert_eq!(player.state().stance, Stance::Crouch);
    assert!(player.requests().crouch);
    assert_eq!(motor.capsule.height, player.config().crouch_height);
}

#[test]
fn test_stand_granted_without_overlap() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    player.update_input(&toggle_crouch(CharacterInput::default()));
    motor.run_tick(&mut player, DT);

    player.update_input(&toggle_crouch(CharacterInput::default()));
    motor.run_tick(&mut player, DT);

    assert_eq!(player.state().stance, Stance::Stand);
    assert_eq!(motor.capsule.height, player.config().stand_height);
    assert_eq!(motor.capsule.y_offset, player.config().stand_height * 0.5);
}

#[test]
fn test_crouch_pressed_in_air_boosts_landing_slide() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    for _ in 0..10 {
        player.update_input(&forward());
        motor.run_tick(&mut player, DT);
    }

    motor.set_airborne();
    player.update_input(&forward());
    motor.run_tick(&mut player, DT);
    player.update_input(&toggle_crouch(forward()));
    assert!(player.requests().crouch_in_air);
    for _ in 0..3 {
        motor.run_tick(&mut player, DT);
    }
    assert_eq!(player.state().stance, Stance::Crouch);

    motor.set_stable_ground(Vector3::y());
    player.update_input(&forward());
    motor.run_tick(&mut player, DT);

    assert_eq!(player.state().stance, Stance::Slide);
    assert!(motor.velocity.norm() >= player.config().slide_start_speed - 1.0e-3);
    assert!(!player.requests().crouch_in_air, "latch spent by the landing");
}

#[test]
fn test_landing_crouched_slides_at_start_speed() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    player.update_input(&toggle_crouch(CharacterInput::default()));
    motor.run_tick(&mut player, DT);
    // Settle so the previous-tick stance is Crouch and walking doesn't start a slide.
    player.update_input(&CharacterInput::default());
    motor.run_tick(&mut player, DT);
    for _ in 0..30 {
        player.update_input(&forward());
        motor.run_tick(&mut player, DT);
    }
    assert_eq!(player.state().stance, Stance::Crouch);

    motor.set_airborne();
    for _ in 0..3 {
        player.update_input(&forward());
        motor.run_tick(&mut player, DT);
    }
    assert!(!player.requests().crouch_in_air);
    let carried = planar_speed(&player.state().velocity);
    assert!(carried < player.config().slide_start_speed);

    motor.set_stable_ground(Vector3::y());
    player.update_input(&forward());
    motor.run_tick(&mut player, DT);

    assert_eq!(player.state().stance, Stance::Slide);
    let speed = motor.velocity.norm();
    assert!(
        (speed - player.config().slide_start_speed).abs() < 1.0e-3,
        "slow landing is raised to start speed: {speed}"
    );
    assert!(motor.velocity.z > 0.0, "keeps the carried heading");
    assert!(!player.requests().crouch_in_air);
}

#[test]
fn test_air_speed_never_exceeds_cap_from_below() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    motor.set_airborne();
    let cap = player.config().air_speed;
    let diagonal = CharacterInput {
        move_axis: Vector2::new(0.7, 0.7),
        ..CharacterInput::default()
    };
    for _ in 0..60 {
        player.update_input(&diagonal);
        motor.run_tick(&mut player, DT);
        assert!(planar_speed(&motor.velocity) <= cap + 1.0e-3);
    }
    assert!(planar_speed(&motor.velocity) > cap - 0.5);
}

#[test]
fn test_tangent_movement_on_slope_follows_surface() {
    let (mut player, mut motor) = player_with(LocomotionConfig::default());
    let normal = Vector3::new(0.0, 1.0, -0.5).normalize();
    motor.set_stable_ground(normal);
    for _ in 0..30 {
        player.update_input(&forward());
        motor.run_tick(&mut player, DT);
    }
    assert!(motor.velocity.dot(&normal).abs() < 1.0e-3, "velocity leaves the surface");
    assert!(motor.velocity.y > 0.0, "walking uphill");
    assert!(motor.velocity.norm() <= player.config().walk_speed + 1.0e-3);
}
