//! Skyfire headless runner
//!
//! Drives the simulation with a scripted autopilot for a fixed number of
//! frames and logs the event stream. Useful for balance checks and soak runs:
//!
//! ```text
//! RUST_LOG=info skyfire --frames 7200 --seed 42 --tuning tuning.json --spawn boss
//! ```

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use skyfire::renderer::{draw_list, instances};
use skyfire::sim::{GamePhase, GameState, Simulation, SimHost, SoundCue, TickInput, WaveKind};
use skyfire::{Settings, SimError, Tuning};

/// Frame interval fed to the clock (60 Hz display)
const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "skyfire")]
#[command(about = "Run the shooter simulation headless with a scripted pilot")]
struct Cli {
    /// Frames to simulate (60 per second)
    #[arg(long, default_value_t = 3600)]
    frames: u64,
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Tuning JSON; omitted fields keep their defaults
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Settings JSON; a missing file falls back to defaults
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Extra enemy placed across the top when the run starts (repeatable)
    #[arg(long = "spawn", value_name = "KIND")]
    spawns: Vec<String>,
}

/// Host that tallies notifications and logs the interesting ones
#[derive(Default)]
struct Report {
    score: u64,
    lives_lost: u32,
    extra_lives: u32,
    kills: u32,
    powerups: u32,
    waves: u32,
    game_over: bool,
}

impl SimHost for Report {
    fn on_score(&mut self, _points: u32, total: u64) {
        self.score = total;
    }

    fn on_life_lost(&mut self, lives_left: u8) {
        self.lives_lost += 1;
        log::info!("Life lost, {lives_left} left");
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.game_over = true;
        log::info!("Game over: {final_score}");
    }

    fn on_extra_life(&mut self, lives: u8) {
        self.extra_lives += 1;
        log::info!("Extra life ({lives})");
    }

    fn on_sound(&mut self, cue: SoundCue) {
        match cue {
            SoundCue::EnemyDeath => self.kills += 1,
            SoundCue::Powerup => self.powerups += 1,
            _ => {}
        }
        log::trace!("sound: {}", cue.name());
    }

    fn on_wave(&mut self, index: u32, kind: WaveKind) {
        self.waves += 1;
        log::debug!("Wave {} ({kind:?})", index + 1);
    }
}

/// Follow the nearest air enemy, fire constantly, bomb the nearest standing
/// ground target ahead every couple of seconds
fn autopilot(state: &GameState) -> TickInput {
    let ship = state.player.body.pos;
    let chase = state
        .enemies
        .air_targets()
        .into_iter()
        .map(|(_, pos)| pos)
        .filter(|pos| pos.y < ship.y)
        .min_by(|a, b| {
            a.distance_squared(ship)
                .partial_cmp(&b.distance_squared(ship))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let movement = match chase {
        Some(pos) => Vec2::new((pos.x - ship.x).clamp(-1.0, 1.0), 0.0),
        None => Vec2::ZERO,
    };

    let bomb_target = state
        .world
        .targets
        .iter()
        .filter(|t| !t.destroyed && t.body.pos.y < ship.y && t.body.pos.y > 0.0)
        .map(|t| t.body.pos)
        .min_by(|a, b| {
            a.distance_squared(ship)
                .partial_cmp(&b.distance_squared(ship))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    TickInput {
        movement,
        fire: true,
        bomb: bomb_target.is_some() && state.frame % 120 == 0,
        bomb_target,
        ..Default::default()
    }
}

fn main() -> Result<(), SimError> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    let cli = Cli::parse();

    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    log::info!(
        "Skyfire headless run: seed {}, {} frames, quality {}",
        cli.seed,
        cli.frames,
        settings.quality.as_str()
    );

    let mut sim = Simulation::new(GameState::with_config(cli.seed, tuning, settings));
    let mut report = Report::default();
    let start = TickInput {
        start: true,
        ..Default::default()
    };
    sim.frame(0.0, &start, &mut report);

    let lanes = cli.spawns.len() as f32 + 1.0;
    let width = sim.state.tuning.world_width;
    for (i, name) in cli.spawns.iter().enumerate() {
        let x = width * (i as f32 + 1.0) / lanes;
        let index = sim.state.spawn_enemy(name, Vec2::new(x, 60.0));
        log::info!("Placed {} at x={x:.0}", sim.state.enemies.enemies[index].kind.name());
    }

    let mut peak_draws = 0;
    for frame in 1..=cli.frames {
        let input = autopilot(&sim.state);
        sim.frame(frame as f64 * FRAME_MS, &input, &mut report);

        let draws = instances(&draw_list(&sim.state));
        peak_draws = peak_draws.max(draws.len());

        if sim.state.phase != GamePhase::Playing {
            log::info!("Run ended after {frame} frames");
            break;
        }
    }

    log::info!(
        "Score {} | kills {} | powerups {} | waves {}",
        report.score,
        report.kills,
        report.powerups,
        report.waves
    );
    log::info!(
        "Lives lost {} | extra lives {} | game over {}",
        report.lives_lost,
        report.extra_lives,
        report.game_over
    );
    log::info!(
        "Sim time {:.1}s | peak draw instances {} | particle slots {}",
        sim.state.time,
        peak_draws,
        sim.state.particles.total_slots()
    );
    Ok(())
}
