//! Outbound notifications
//!
//! Subsystems push [`GameEvent`]s into an [`EventQueue`] while they update.
//! The tick flushes the queue to the host once per frame, after cleanup, so
//! the host always observes a settled frame and can never stall the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemies::WaveKind;

/// Fire-and-forget audio trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Laser,
    Bomb,
    Explosion,
    Hit,
    EnemyDeath,
    BulletDestroy,
    Powerup,
    PlayerDeath,
    ExtraLife,
    GameOver,
}

impl SoundCue {
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Laser => "laser",
            SoundCue::Bomb => "bomb",
            SoundCue::Explosion => "explosion",
            SoundCue::Hit => "hit",
            SoundCue::EnemyDeath => "enemyDeath",
            SoundCue::BulletDestroy => "bulletDestroy",
            SoundCue::Powerup => "powerup",
            SoundCue::PlayerDeath => "playerDeath",
            SoundCue::ExtraLife => "extraLife",
            SoundCue::GameOver => "gameOver",
        }
    }
}

/// Game event (for UI/audio/effects)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Points awarded this frame
    Score(u32),
    /// The player ship was destroyed
    LifeLost,
    GameOver,
    ExtraLife,
    Sound(SoundCue),
    Wave { index: u32, kind: WaveKind },
}

/// Per-frame event buffer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    events: Vec<GameEvent>,
    /// Powerup drops requested by dying enemies
    drops: Vec<Vec2>,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn score(&mut self, points: u32) {
        if points > 0 {
            self.events.push(GameEvent::Score(points));
        }
    }

    pub fn request_drop(&mut self, pos: Vec2) {
        self.drops.push(pos);
    }

    pub fn take_drops(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.drops)
    }

    pub fn pending(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.drops.clear();
    }
}

/// Host callbacks. Every method defaults to a no-op.
pub trait SimHost {
    fn on_score(&mut self, _points: u32, _total: u64) {}
    fn on_life_lost(&mut self, _lives_left: u8) {}
    fn on_game_over(&mut self, _final_score: u64) {}
    fn on_extra_life(&mut self, _lives: u8) {}
    fn on_sound(&mut self, _cue: SoundCue) {}
    fn on_wave(&mut self, _index: u32, _kind: WaveKind) {}
}

/// Host that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl SimHost for NullHost {}

/// Host that records every notification in order
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventLog {
    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn total_score(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match e {
                GameEvent::Score(p) => u64::from(*p),
                _ => 0,
            })
            .sum()
    }
}

impl SimHost for EventLog {
    fn on_score(&mut self, points: u32, _total: u64) {
        self.events.push(GameEvent::Score(points));
    }

    fn on_life_lost(&mut self, _lives_left: u8) {
        self.events.push(GameEvent::LifeLost);
    }

    fn on_game_over(&mut self, _final_score: u64) {
        self.events.push(GameEvent::GameOver);
    }

    fn on_extra_life(&mut self, _lives: u8) {
        self.events.push(GameEvent::ExtraLife);
    }

    fn on_sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    fn on_wave(&mut self, index: u32, kind: WaveKind) {
        self.events.push(GameEvent::Wave { index, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_is_dropped() {
        let mut q = EventQueue::default();
        q.score(0);
        q.score(50);
        assert_eq!(q.pending(), &[GameEvent::Score(50)]);
    }

    #[test]
    fn test_event_log_totals() {
        let mut log = EventLog::default();
        log.on_score(100, 100);
        log.on_sound(SoundCue::Hit);
        log.on_score(50, 150);
        assert_eq!(log.total_score(), 150);
        assert_eq!(log.count(|e| matches!(e, GameEvent::Sound(_))), 1);
    }
}
