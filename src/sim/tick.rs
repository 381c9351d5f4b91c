//! Frame driver
//!
//! Core game loop that advances the simulation one variable, capped step at a
//! time in a fixed subsystem order.

use glam::Vec2;

use super::collision::Scene;
use super::events::{GameEvent, SimHost, SoundCue};
use super::state::{GamePhase, GameState, SimContext};
use crate::consts::*;

/// Converts raw host timestamps into capped frame steps
#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    last: Option<f64>,
    cap: f32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(FRAME_DT_CAP)
    }
}

impl SimulationClock {
    pub fn new(cap: f32) -> Self {
        Self { last: None, cap }
    }

    /// Seconds since the previous timestamp (milliseconds), capped. The first
    /// call and backwards jumps yield 0.
    pub fn advance(&mut self, timestamp_ms: f64) -> f32 {
        let dt = match self.last {
            Some(prev) => ((timestamp_ms - prev) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last = Some(timestamp_ms);
        dt.min(self.cap)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction (normalized; longer vectors are clamped)
    pub movement: Vec2,
    pub fire: bool,
    pub bomb: bool,
    /// Bomb target; defaults to a point straight ahead of the ship
    pub bomb_target: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Menu: begin a run. Game over: back to the menu.
    pub start: bool,
    /// Paused: abandon the run
    pub quit: bool,
}

/// Advance the game by one frame and notify the host of what happened
pub fn tick<H: SimHost>(state: &mut GameState, input: &TickInput, dt: f32, host: &mut H) {
    match state.phase {
        GamePhase::Menu => {
            if input.start {
                state.reset_run();
                state.phase = GamePhase::Playing;
            }
            return;
        }
        GamePhase::GameOver => {
            if input.start {
                state.phase = GamePhase::Menu;
            }
            return;
        }
        GamePhase::Paused => {
            if input.quit {
                log::info!("Run abandoned at {}", state.score);
                state.phase = GamePhase::Menu;
                return;
            }
            if !input.pause {
                return;
            }
            state.phase = GamePhase::Playing;
        }
        GamePhase::Playing => {
            if input.pause {
                state.phase = GamePhase::Paused;
                return;
            }
        }
    }

    step(state, input, dt);
    flush(state, host);
}

/// One playing frame: input, world, player, weapons, enemies, powerups,
/// particles, collisions, cleanup
fn step(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, state.tuning.frame_dt_cap);
    state.time += dt;
    state.frame += 1;

    let GameState {
        tuning,
        rng,
        ids,
        events,
        particles,
        time,
        lives,
        player,
        weapons,
        enemies,
        powerups,
        world,
        collision,
        ..
    } = state;
    let mut ctx = SimContext {
        tuning,
        rng,
        ids,
        events,
        particles,
        now: *time,
    };
    let (width, height) = (ctx.tuning.world_width, ctx.tuning.world_height);

    player.apply_movement(input.movement, dt, width, height);
    if player.is_alive() {
        let nose = player.body.pos - Vec2::new(0.0, player.body.size.y / 2.0);
        if input.fire {
            let targets = enemies.air_targets();
            weapons.fire_laser(
                &mut ctx,
                nose,
                player.laser_power,
                player.fire_modifiers(),
                &mut player.satellites,
                &targets,
            );
        }
        if input.bomb {
            let target = input
                .bomb_target
                .unwrap_or(player.body.pos - Vec2::new(0.0, BOMB_DEFAULT_RANGE));
            weapons.fire_bomb(&mut ctx, nose, target, player.bomb_power);
        }
    }

    world.update(&mut ctx, dt);
    player.update(&mut ctx, dt);
    let targets = enemies.air_targets();
    weapons.update(&mut ctx, dt, &targets);
    enemies.update(&mut ctx, dt, player.position());
    powerups.update(&mut ctx, dt);
    ctx.particles.update(dt);

    collision.run(
        &mut ctx,
        &mut Scene {
            player: &mut *player,
            lives: &mut *lives,
            weapons: &mut *weapons,
            enemies: &mut *enemies,
            powerups: &mut *powerups,
            world: &mut *world,
        },
    );

    weapons.cleanup();
    enemies.cleanup();
    powerups.cleanup();
}

/// Apply queued events to the run totals and forward them to the host
fn flush<H: SimHost>(state: &mut GameState, host: &mut H) {
    let GameState {
        events,
        phase,
        score,
        lives,
        next_extra_life,
        ..
    } = state;

    for event in events.drain() {
        match event {
            GameEvent::Score(points) => {
                *score += u64::from(points);
                host.on_score(points, *score);
                while *score >= *next_extra_life {
                    *next_extra_life += EXTRA_LIFE_SCORE;
                    *lives = (*lives + 1).min(PLAYER_MAX_LIVES);
                    log::info!("Extra life at {} points", *score);
                    host.on_extra_life(*lives);
                    host.on_sound(SoundCue::ExtraLife);
                }
            }
            GameEvent::LifeLost => {
                *lives = lives.saturating_sub(1);
                host.on_life_lost(*lives);
                if *lives == 0 && *phase == GamePhase::Playing {
                    *phase = GamePhase::GameOver;
                    log::info!("Game over with {} points", *score);
                    host.on_sound(SoundCue::GameOver);
                    host.on_game_over(*score);
                }
            }
            GameEvent::GameOver => host.on_game_over(*score),
            GameEvent::ExtraLife => host.on_extra_life(*lives),
            GameEvent::Sound(cue) => host.on_sound(cue),
            GameEvent::Wave { index, kind } => host.on_wave(index, kind),
        }
    }
}

/// Game state plus the clock that feeds it raw timestamps
#[derive(Debug, Clone)]
pub struct Simulation {
    pub state: GameState,
    pub clock: SimulationClock,
}

impl Simulation {
    pub fn new(state: GameState) -> Self {
        let clock = SimulationClock::new(state.tuning.frame_dt_cap);
        Self { state, clock }
    }

    /// Run one frame for a host timestamp in milliseconds; returns the step used
    pub fn frame<H: SimHost>(&mut self, timestamp_ms: f64, input: &TickInput, host: &mut H) -> f32 {
        let dt = self.clock.advance(timestamp_ms);
        tick(&mut self.state, input, dt, host);
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::enemies::{Enemy, EnemyKind, WaveKind};
    use crate::sim::events::{EventLog, NullHost};
    use crate::tuning::Tuning;

    const DT: f32 = 0.016;

    fn quiet_tuning() -> Tuning {
        Tuning {
            spawn_interval_start: 1000.0,
            spawn_interval_floor: 1000.0,
            wave_period: 1000.0,
            powerup_spawn_interval: 1000.0,
            ..Tuning::default()
        }
    }

    fn playing(tuning: Tuning) -> GameState {
        let mut state = GameState::with_config(5, tuning, Settings::default());
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, DT, &mut NullHost);
        assert_eq!(state.phase, GamePhase::Playing);
        state
    }

    #[test]
    fn test_clock_caps_and_starts_at_zero() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.advance(1000.0), 0.0);
        assert!((clock.advance(1010.0) - 0.010).abs() < 1e-6);
        assert_eq!(clock.advance(5000.0), FRAME_DT_CAP);
        assert_eq!(clock.advance(4000.0), 0.0);
        clock.reset();
        assert_eq!(clock.advance(9000.0), 0.0);
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = GameState::new(1);
        let none = TickInput::default();
        tick(&mut state, &none, DT, &mut NullHost);
        assert_eq!(state.phase, GamePhase::Menu);

        let mut state = playing(Tuning::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, DT, &mut NullHost);
        assert_eq!(state.phase, GamePhase::Paused);
        tick(&mut state, &pause, DT, &mut NullHost);
        assert_eq!(state.phase, GamePhase::Playing);

        tick(&mut state, &pause, DT, &mut NullHost);
        let quit = TickInput {
            quit: true,
            ..Default::default()
        };
        tick(&mut state, &quit, DT, &mut NullHost);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_pause_freezes_timers() {
        let mut state = playing(Tuning::default());
        let none = TickInput::default();
        for _ in 0..30 {
            tick(&mut state, &none, DT, &mut NullHost);
        }
        let snapshot = (
            state.time,
            state.frame,
            state.enemies.spawn_timer,
            state.enemies.wave_timer,
            state.powerups.spawn_timer,
            state.player.body.age,
            state.world.scroll_offset,
            state.particles.active_count(),
        );

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, DT, &mut NullHost);
        for _ in 0..100 {
            tick(&mut state, &none, DT, &mut NullHost);
        }
        assert_eq!(state.phase, GamePhase::Paused);
        let after = (
            state.time,
            state.frame,
            state.enemies.spawn_timer,
            state.enemies.wave_timer,
            state.powerups.spawn_timer,
            state.player.body.age,
            state.world.scroll_offset,
            state.particles.active_count(),
        );
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_basic_kill_through_tick() {
        let mut state = playing(quiet_tuning());
        state.world.targets.clear();
        let drone_pos = state.player.body.pos - Vec2::new(0.0, 60.0);
        let id = state.next_entity_id();
        let drone = Enemy::new(id, EnemyKind::Drone, drone_pos, 0.0);
        let points = drone.points;
        state.enemies.enemies.push(drone);

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        let mut log = EventLog::default();
        tick(&mut state, &fire, DT, &mut log);

        assert!(state.enemies.enemies.is_empty());
        assert_eq!(log.total_score(), u64::from(points));
        assert_eq!(state.score, u64::from(points));
        assert_eq!(log.count(|e| *e == GameEvent::Sound(SoundCue::EnemyDeath)), 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut state = playing(Tuning::default());
            let mut log = EventLog::default();
            for frame in 0..1500u32 {
                let input = TickInput {
                    movement: Vec2::new(((frame / 60) as f32).sin(), 0.0),
                    fire: frame % 3 == 0,
                    bomb: frame % 90 == 0,
                    ..Default::default()
                };
                tick(&mut state, &input, DT, &mut log);
            }
            let positions: Vec<Vec2> = state.enemies.enemies.iter().map(|e| e.body.pos).collect();
            (state.score, state.lives, positions, log.events.len())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_last_life_ends_the_run() {
        let mut state = playing(quiet_tuning());
        state.lives = 1;
        state.player.health = 1;
        let at = state.player.body.pos;
        state
            .enemies
            .stray_bullets
            .push(crate::sim::weapons::Projectile::enemy_bullet(999, at, Vec2::ZERO));

        let mut log = EventLog::default();
        tick(&mut state, &TickInput::default(), DT, &mut log);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.lives, 0);
        assert_eq!(log.count(|e| *e == GameEvent::GameOver), 1);
        assert_eq!(log.count(|e| *e == GameEvent::LifeLost), 1);

        // Frozen until start returns to the menu
        let time = state.time;
        tick(&mut state, &TickInput::default(), DT, &mut log);
        assert_eq!(state.time, time);
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, DT, &mut log);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_extra_life_on_threshold_crossing() {
        let mut state = playing(quiet_tuning());
        state.score = EXTRA_LIFE_SCORE - 10;
        state.events.score(20);
        let mut log = EventLog::default();
        tick(&mut state, &TickInput::default(), DT, &mut log);
        assert_eq!(state.lives, PLAYER_START_LIVES + 1);
        assert_eq!(state.next_extra_life, 2 * EXTRA_LIFE_SCORE);

        // No second life until the next threshold
        state.events.score(20);
        tick(&mut state, &TickInput::default(), DT, &mut log);
        assert_eq!(state.lives, PLAYER_START_LIVES + 1);
        assert_eq!(log.count(|e| *e == GameEvent::ExtraLife), 1);
    }

    #[test]
    fn test_wave_event_reaches_host() {
        let mut state = playing(Tuning {
            spawn_interval_start: 1000.0,
            spawn_interval_floor: 1000.0,
            ..Tuning::default()
        });
        state.enemies.wave_timer = state.tuning.wave_period - 0.001;
        let mut log = EventLog::default();
        tick(&mut state, &TickInput::default(), DT, &mut log);
        assert_eq!(log.count(|e| matches!(e, GameEvent::Wave { .. })), 1);
        assert_eq!(state.enemies.wave_timer, 0.0);
        assert!(matches!(
            log.events.iter().find(|e| matches!(e, GameEvent::Wave { .. })),
            Some(GameEvent::Wave {
                index: 0,
                kind: WaveKind::Formation | WaveKind::Swarm | WaveKind::Boss
            })
        ));
    }

    #[test]
    fn test_long_run_stays_bounded() {
        let mut sim = Simulation::new(playing(Tuning::default()));
        let fire = TickInput {
            fire: true,
            movement: Vec2::new(0.3, 0.0),
            ..Default::default()
        };
        let mut t = 0.0;
        for _ in 0..6000 {
            t += 16.0;
            sim.frame(t, &fire, &mut NullHost);
            if sim.state.phase != GamePhase::Playing {
                break;
            }
            let particles = &sim.state.particles;
            assert_eq!(
                particles.active_count() + particles.pooled_count(),
                particles.total_slots()
            );
            assert!(sim.state.weapons.lasers.iter().all(|l| l.body.active));
            assert!(
                sim.state
                    .enemies
                    .enemies
                    .iter()
                    .all(|e| e.body.age <= crate::sim::enemies::ENEMY_MAX_AGE)
            );
        }
        assert!(sim.state.frame > 0);
    }
}
