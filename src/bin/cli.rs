//! Stride CLI - run scripted locomotion scenarios against a small rapier course

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::path::PathBuf;

use stride::character::{CharacterInput, PlayerCharacter, RawInput};
use stride::config::SimConfig;
use stride::logging;
use stride::physics::{simulate_character, PhysicsWorld};

const PLAYER_ID: u64 = 1000;

const FLOOR_ID: u64 = 1;
const RAMP_ID: u64 = 2;
const CEILING_ID: u64 = 3;

#[derive(Parser)]
#[command(name = "stride-sim")]
#[command(about = "Run a scripted first-person locomotion scenario", long_about = None)]
struct Cli {
    /// Simulation config (TOML). Defaults apply when omitted.
    #[arg(short, long, env = "STRIDE_CONFIG")]
    config: Option<PathBuf>,
    /// Scripted input sequence to play
    #[arg(short, long, value_enum, default_value_t = Scenario::Walk)]
    scenario: Scenario,
    /// Number of fixed ticks to simulate
    #[arg(short, long, default_value = "240")]
    ticks: u32,
    /// Log the character state every N ticks
    #[arg(long, default_value = "20")]
    report_every: u32,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Walk forward onto the ramp
    Walk,
    /// Run, then a held jump
    Jump,
    /// Run, then crouch into a slide
    Slide,
    /// Crouch-walk under the low ceiling and try to stand beneath it
    CrouchUnder,
}

impl Scenario {
    fn spawn(self) -> [f32; 3] {
        match self {
            Scenario::CrouchUnder => [10.0, 0.05, 0.0],
            _ => [0.0, 0.05, 0.0],
        }
    }

    /// Raw device readings for `tick`.
    fn input(self, tick: u32) -> RawInput {
        let forward = Vector2::new(0.0, 1.0);
        let mut raw = RawInput {
            look_rotation: UnitQuaternion::identity(),
            move_axis: forward,
            ..RawInput::default()
        };
        match self {
            Scenario::Walk => {}
            Scenario::Jump => {
                raw.jump_pressed = tick == 30;
                raw.jump_held = (30..45).contains(&tick);
            }
            Scenario::Slide => {
                raw.crouch_pressed = tick == 30;
            }
            Scenario::CrouchUnder => {
                // Crouch while still so it doesn't turn into a slide.
                if tick == 0 {
                    raw.move_axis = Vector2::zeros();
                    raw.crouch_pressed = true;
                }
                raw.crouch_pressed |= tick == 100;
            }
        }
        raw
    }
}

/// Floor, a ramp ahead of the spawn lane and a low ceiling over the crouch lane.
fn build_course(world: &mut PhysicsWorld) {
    world.add_block(
        FLOOR_ID,
        [0.0, -0.5, 0.0],
        UnitQuaternion::identity(),
        [400.0, 1.0, 400.0],
        true,
    );
    let ramp_tilt = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -20.0_f32.to_radians());
    world.add_block(RAMP_ID, [0.0, 0.0, 60.0], ramp_tilt, [8.0, 1.0, 20.0], true);
    // Underside at y = 1.5: a crouched capsule fits, a standing one doesn't.
    world.add_block(CEILING_ID, [10.0, 2.0, 15.0], UnitQuaternion::identity(), [8.0, 1.0, 10.0], true);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.report_every == 0 {
        bail!("--report-every must be at least 1");
    }

    let config = match &cli.config {
        Some(path) => SimConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    let dt = config.timestep;

    let mut world = PhysicsWorld::new(config.motor.clone());
    build_course(&mut world);
    world.add_character(PLAYER_ID, cli.scenario.spawn(), config.locomotion.stand_height);

    let mut player = PlayerCharacter::with_flashlight(config.locomotion.clone());
    let mut motor = world.motor(PLAYER_ID).context("player was not spawned")?;
    player.initialize(&mut motor);

    log::info!(
        "running {:?} for {} ticks at {:.4}s per tick",
        cli.scenario,
        cli.ticks,
        dt
    );

    for tick in 0..cli.ticks {
        let input = CharacterInput::from_raw(&cli.scenario.input(tick), config.input.move_deadzone);
        player.update_input(&input);

        simulate_character(&mut world, PLAYER_ID, &mut player, dt).context("player vanished")?;

        let motor = world.motor(PLAYER_ID).context("player vanished")?;
        player.update_body(&motor, dt);

        if tick % cli.report_every == 0 || tick + 1 == cli.ticks {
            let body = world.character(PLAYER_ID).context("player vanished")?;
            let state = player.state();
            log::info!(
                "tick {:4} pos ({:7.2}, {:5.2}, {:7.2}) speed {:6.2} stance {:?} grounded {} camera {:.2}",
                tick,
                body.position.x,
                body.position.y,
                body.position.z,
                state.velocity.norm(),
                state.stance,
                state.grounded,
                player.camera_target().y,
            );
        }
    }

    Ok(())
}
