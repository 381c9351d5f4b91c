//! Per-frame draw descriptions
//!
//! The simulation never draws. After cleanup the host asks for a draw list and
//! renders it however it likes; inactive entities never appear in it.

use glam::Vec2;

use super::instance::colors;
use crate::sim::enemies::EnemyKind;
use crate::sim::particles::{ParticleKind, Rgb};
use crate::sim::state::GameState;
use crate::sim::world::GroundKind;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Ground,
    Powerup,
    Enemy,
    EnemyBullet,
    Laser,
    Bomb,
    Explosion,
    Player,
    Shield,
    Satellite,
    Particle,
}

/// Pure description of one thing to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub kind: DrawKind,
    /// Center in world pixels
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    /// RGBA color hint; alpha carries fades and blinking
    pub color: [f32; 4],
}

impl DrawItem {
    fn new(kind: DrawKind, position: Vec2, size: Vec2, color: [f32; 4]) -> Self {
        Self {
            kind,
            position,
            size,
            rotation: 0.0,
            color,
        }
    }

    fn rotated_along(mut self, vel: Vec2) -> Self {
        if vel != Vec2::ZERO {
            self.rotation = vel.x.atan2(-vel.y);
        }
        self
    }
}

fn with_alpha(rgb: Rgb, alpha: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], alpha.clamp(0.0, 1.0)]
}

fn enemy_color(kind: EnemyKind, phase: u8) -> [f32; 4] {
    match kind {
        EnemyKind::Drone => [0.8, 0.2, 0.2, 1.0],
        EnemyKind::Fighter => [0.9, 0.5, 0.1, 1.0],
        EnemyKind::Bomber => [0.5, 0.3, 0.7, 1.0],
        EnemyKind::Interceptor => [0.9, 0.9, 0.2, 1.0],
        EnemyKind::Turret => [0.5, 0.5, 0.5, 1.0],
        EnemyKind::Boss if phase >= 2 => [1.0, 0.1, 0.1, 1.0],
        EnemyKind::Boss => [0.7, 0.1, 0.3, 1.0],
    }
}

fn ground_color(kind: GroundKind) -> [f32; 4] {
    match kind {
        GroundKind::Building => [0.4, 0.4, 0.45, 1.0],
        GroundKind::Tower => [0.55, 0.5, 0.4, 1.0],
        GroundKind::Facility => [0.3, 0.45, 0.3, 1.0],
        GroundKind::Radar => [0.35, 0.4, 0.55, 1.0],
    }
}

/// Build the draw list back to front
pub fn draw_list(state: &GameState) -> Vec<DrawItem> {
    let mut items = Vec::new();

    for target in &state.world.targets {
        let color = if target.destroyed {
            colors::RUBBLE
        } else {
            ground_color(target.kind)
        };
        items.push(DrawItem::new(DrawKind::Ground, target.body.pos, target.body.size, color));
    }

    for powerup in state.powerups.powerups.iter().filter(|p| p.body.active && p.visible()) {
        items.push(DrawItem::new(
            DrawKind::Powerup,
            powerup.body.pos,
            powerup.body.size,
            with_alpha(powerup.kind.color(), 1.0),
        ));
    }

    for enemy in state.enemies.enemies.iter().filter(|e| e.body.active) {
        items.push(DrawItem::new(
            DrawKind::Enemy,
            enemy.body.pos,
            enemy.body.size,
            enemy_color(enemy.kind, enemy.phase),
        ));
    }

    let bullets = state
        .enemies
        .enemies
        .iter()
        .flat_map(|e| e.bullets.iter())
        .chain(state.enemies.stray_bullets.iter())
        .filter(|b| b.body.active);
    for bullet in bullets {
        let body = &bullet.body;
        items.push(
            DrawItem::new(DrawKind::EnemyBullet, body.pos, body.size, colors::ENEMY_BULLET)
                .rotated_along(body.vel),
        );
    }

    for laser in state.weapons.lasers.iter().filter(|l| l.body.active) {
        let body = &laser.body;
        items.push(
            DrawItem::new(DrawKind::Laser, body.pos, body.size, colors::laser(laser.power))
                .rotated_along(body.vel),
        );
    }

    for bomb in state.weapons.bombs.iter().filter(|b| b.body.active) {
        items.push(
            DrawItem::new(DrawKind::Bomb, bomb.body.pos, bomb.body.size, colors::BOMB)
                .rotated_along(bomb.body.vel),
        );
    }

    for explosion in state.weapons.explosions.iter().filter(|e| e.active) {
        let mut color = colors::EXPLOSION;
        color[3] = explosion.alpha();
        items.push(DrawItem::new(
            DrawKind::Explosion,
            explosion.pos,
            Vec2::splat(explosion.radius * 2.0),
            color,
        ));
    }

    let player = &state.player;
    if player.body.active {
        let mut color = colors::PLAYER;
        // Blink while invulnerable
        if player.invulnerable > 0.0 && (player.invulnerable * 10.0).fract() < 0.5 {
            color[3] = 0.3;
        }
        items.push(DrawItem::new(DrawKind::Player, player.body.pos, player.body.size, color));
        if player.effects.shielded() {
            items.push(DrawItem::new(
                DrawKind::Shield,
                player.body.pos,
                Vec2::splat(player.body.size.y * 1.5),
                colors::SHIELD,
            ));
        }
        for satellite in &player.satellites {
            items.push(DrawItem::new(
                DrawKind::Satellite,
                satellite.pos,
                Vec2::splat(12.0),
                colors::SATELLITE,
            ));
        }
    }

    for particle in state.particles.iter() {
        let rotation = match particle.kind {
            ParticleKind::Spark | ParticleKind::Trail => particle.vel.x.atan2(-particle.vel.y),
            _ => 0.0,
        };
        items.push(DrawItem {
            kind: DrawKind::Particle,
            position: particle.pos,
            size: Vec2::splat(particle.size),
            rotation,
            color: with_alpha(particle.color, particle.alpha),
        });
    }

    items
}
