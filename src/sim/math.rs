//! 2D geometry primitives
//!
//! Vectors are `glam::Vec2`; this module adds the axis-aligned rectangle used
//! for hit boxes, the circle-vs-rectangle test used by explosions, and the
//! sampling helpers shared by the spawners.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Overlap test. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Closest point on (or inside) the rectangle to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }
}

/// Circle vs rectangle: true when the closest point is within `radius`
pub fn circle_rect_intersects(center: Vec2, radius: f32, rect: &Rect) -> bool {
    rect.closest_point(center).distance_squared(center) <= radius * radius
}

/// Uniform float in `[min, max)`; returns `min` for an empty range
pub fn random_range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Cumulative-weight sampling. Falls back to the first entry when every
/// weight is zero; returns `None` only for an empty table.
pub fn weighted_choice<T: Copy, R: Rng>(rng: &mut R, table: &[(T, u32)]) -> Option<T> {
    let first = table.first()?.0;
    let total: u32 = table.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return Some(first);
    }
    let mut roll = rng.random_range(0..total);
    for &(item, weight) in table {
        if roll < weight {
            return Some(item);
        }
        roll -= weight;
    }
    Some(first)
}

/// Unit vector for an angle measured from +x (y down)
pub fn from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
