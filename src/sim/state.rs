//! Game state and the per-frame simulation context
//!
//! [`GameState`] owns every subsystem. Subsystems never reach back into it;
//! instead the tick lends them a [`SimContext`] holding the shared services
//! (tuning, RNG, id allocator, event queue, particles, clock).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CollisionSystem;
use super::enemies::EnemyManager;
use super::entity::{EntityId, IdAllocator};
use super::events::EventQueue;
use super::particles::ParticleManager;
use super::player::Player;
use super::powerups::PowerupManager;
use super::weapons::WeaponSystem;
use super::world::World;
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Particles draw from their own stream so toggling them leaves gameplay untouched
const PARTICLE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Shared services lent to subsystems for one update
pub struct SimContext<'a> {
    pub tuning: &'a Tuning,
    pub rng: &'a mut Pcg32,
    pub ids: &'a mut IdAllocator,
    pub events: &'a mut EventQueue,
    pub particles: &'a mut ParticleManager,
    /// Seconds of play so far; frozen outside `Playing`
    pub now: f32,
}

/// Run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    Menu,
    Playing,
    Paused,
    /// Run ended; start returns to the menu
    GameOver,
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub tuning: Tuning,
    pub settings: Settings,
    /// Gameplay RNG
    pub rng: Pcg32,
    pub ids: IdAllocator,
    /// Events raised this frame, flushed to the host at the end of the tick
    pub events: EventQueue,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: ParticleManager,
    /// Simulation clock in seconds
    pub time: f32,
    /// Frames simulated while playing
    pub frame: u64,
    pub score: u64,
    pub lives: u8,
    /// Score at which the next extra life is granted
    pub next_extra_life: u64,
    pub player: Player,
    pub weapons: WeaponSystem,
    pub enemies: EnemyManager,
    pub powerups: PowerupManager,
    pub world: World,
    #[serde(skip)]
    pub collision: CollisionSystem,
}

impl GameState {
    /// Create a new game state with the given seed and default configuration
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), Settings::default())
    }

    pub fn with_config(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut ids = IdAllocator::default();
        let mut events = EventQueue::default();
        let mut particles = ParticleManager::from_settings(&settings, seed ^ PARTICLE_STREAM);

        let player = Player::new(ids.next_id(), &tuning);
        let world = World::generate(&mut SimContext {
            tuning: &tuning,
            rng: &mut rng,
            ids: &mut ids,
            events: &mut events,
            particles: &mut particles,
            now: 0.0,
        });

        Self {
            seed,
            phase: GamePhase::Menu,
            rng,
            ids,
            events,
            particles,
            time: 0.0,
            frame: 0,
            score: 0,
            lives: PLAYER_START_LIVES,
            next_extra_life: EXTRA_LIFE_SCORE,
            player,
            weapons: WeaponSystem::default(),
            enemies: EnemyManager::new(&tuning),
            powerups: PowerupManager::default(),
            world,
            collision: CollisionSystem::new(Default::default(), tuning.grid_cell_size),
            tuning,
            settings,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Borrow the shared services for a direct subsystem call
    pub fn context(&mut self) -> SimContext<'_> {
        SimContext {
            tuning: &self.tuning,
            rng: &mut self.rng,
            ids: &mut self.ids,
            events: &mut self.events,
            particles: &mut self.particles,
            now: self.time,
        }
    }

    /// Place an enemy by config name; unknown names become drones
    pub fn spawn_enemy(&mut self, name: &str, pos: Vec2) -> usize {
        let Self {
            tuning,
            rng,
            ids,
            events,
            particles,
            time,
            enemies,
            ..
        } = self;
        let mut ctx = SimContext {
            tuning,
            rng,
            ids,
            events,
            particles,
            now: *time,
        };
        enemies.spawn_named(&mut ctx, name, pos)
    }

    /// Clear every entity and counter for a fresh run. The RNG keeps its
    /// stream so consecutive runs differ.
    pub fn reset_run(&mut self) {
        self.events.clear();
        self.particles.clear();
        self.time = 0.0;
        self.frame = 0;
        self.score = 0;
        self.lives = PLAYER_START_LIVES;
        self.next_extra_life = EXTRA_LIFE_SCORE;
        self.player = Player::new(self.ids.next_id(), &self.tuning);
        self.weapons.clear();
        self.enemies.reset(&self.tuning);
        self.powerups.clear();
        let world = World::generate(&mut self.context());
        self.world = world;
        log::info!("New run (seed {})", self.seed);
    }
}

/// Standalone services for exercising one subsystem at a time
#[cfg(test)]
pub(crate) struct TestBed {
    pub tuning: Tuning,
    pub rng: Pcg32,
    pub ids: IdAllocator,
    pub events: EventQueue,
    pub particles: ParticleManager,
}

#[cfg(test)]
impl TestBed {
    pub fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(7),
            ids: IdAllocator::default(),
            events: EventQueue::default(),
            particles: ParticleManager::new(400, false, 11),
        }
    }

    pub fn ctx_at(&mut self, now: f32) -> SimContext<'_> {
        SimContext {
            tuning: &self.tuning,
            rng: &mut self.rng,
            ids: &mut self.ids,
            events: &mut self.events,
            particles: &mut self.particles,
            now,
        }
    }
}
