//! Bubble entities - the pop targets.
//!
//! Each bubble carries a color from a small fixed palette, a point value
//! derived from that color, a remaining lifetime, and (while part of an
//! active gesture) a frozen chain order.

use bevy::prelude::*;
use rand::Rng;

/// Monotonically increasing bubble identity. Lowest id wins when a touch
/// point overlaps several bubbles, which keeps hit selection reproducible.
pub type BubbleId = u64;

/// Hit radius of every bubble, in world units.
pub const BUBBLE_RADIUS: f32 = 28.0;

/// Natural lifetime range a freshly spawned bubble draws from, in seconds.
pub const LIFETIME_RANGE: std::ops::Range<f32> = 4.0..8.0;

/// The different bubble colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum BubbleColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl BubbleColor {
    /// Point value awarded per bubble of this color when a chain is tallied.
    pub fn points(self) -> i64 {
        match self {
            BubbleColor::Red => 10,
            BubbleColor::Green => 10,
            BubbleColor::Blue => 15,
            BubbleColor::Yellow => 20,
            BubbleColor::Purple => 25,
        }
    }

    /// Get the actual color for rendering.
    pub fn to_color(self) -> Color {
        match self {
            BubbleColor::Red => Color::srgb(0.9, 0.25, 0.25),
            BubbleColor::Green => Color::srgb(0.25, 0.8, 0.35),
            BubbleColor::Blue => Color::srgb(0.25, 0.45, 0.9),
            BubbleColor::Yellow => Color::srgb(0.95, 0.85, 0.2),
            BubbleColor::Purple => Color::srgb(0.7, 0.3, 0.8),
        }
    }

    /// Get a random bubble color.
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..5) {
            0 => BubbleColor::Red,
            1 => BubbleColor::Green,
            2 => BubbleColor::Blue,
            3 => BubbleColor::Yellow,
            _ => BubbleColor::Purple,
        }
    }

    /// All palette colors.
    #[allow(dead_code)]
    pub const ALL: [BubbleColor; 5] = [
        BubbleColor::Red,
        BubbleColor::Green,
        BubbleColor::Blue,
        BubbleColor::Yellow,
        BubbleColor::Purple,
    ];
}

/// A single pop target.
///
/// A bubble is either free (drifting, lifetime counting down) or frozen
/// into the active chain. Frozen bubbles neither drift nor age; they can
/// only leave the field by being force-popped.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub id: BubbleId,
    pub color: BubbleColor,
    pub position: Vec2,
    pub radius: f32,
    drift: Vec2,
    lifetime: f32,
    frozen: Option<u32>,
}

impl Bubble {
    pub fn new(id: BubbleId, color: BubbleColor, position: Vec2, lifetime: f32) -> Self {
        Self {
            id,
            color,
            position,
            radius: BUBBLE_RADIUS,
            drift: Vec2::ZERO,
            lifetime,
            frozen: None,
        }
    }

    pub fn with_drift(mut self, drift: Vec2) -> Self {
        self.drift = drift;
        self
    }

    /// Point value of this bubble.
    pub fn points(&self) -> i64 {
        self.color.points()
    }

    /// True if `point` lies within the bubble's hit region.
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }

    /// Mark this bubble as part of the active chain at `order`
    /// (0 = anchor). Callers only freeze unfrozen bubbles.
    pub fn freeze(&mut self, order: u32) {
        self.frozen = Some(order);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Chain position, if frozen.
    pub fn frozen_order(&self) -> Option<u32> {
        self.frozen
    }

    /// Advance the expiry countdown by `dt` seconds.
    ///
    /// Returns true exactly once, on the call where the countdown crosses
    /// zero. Frozen bubbles never expire: freezing suspends the countdown
    /// until the bubble is force-popped.
    pub fn pop(&mut self, dt: f32) -> bool {
        if self.frozen.is_some() || self.lifetime <= 0.0 {
            return false;
        }
        self.lifetime -= dt;
        self.lifetime <= 0.0
    }

    /// Move along the drift velocity, staying inside `bounds`.
    /// Frozen bubbles hold their position.
    pub fn drift(&mut self, dt: f32, bounds: Rect) {
        if self.frozen.is_some() {
            return;
        }
        self.position += self.drift * dt;
        self.position = self.position.clamp(bounds.min, bounds.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(lifetime: f32) -> Bubble {
        Bubble::new(1, BubbleColor::Red, Vec2::ZERO, lifetime)
    }

    #[test]
    fn test_contains_point() {
        let b = bubble(5.0);
        assert!(b.contains_point(Vec2::ZERO));
        assert!(b.contains_point(Vec2::new(BUBBLE_RADIUS, 0.0)));
        assert!(!b.contains_point(Vec2::new(BUBBLE_RADIUS + 0.1, 0.0)));
    }

    #[test]
    fn test_pop_fires_exactly_once() {
        let mut b = bubble(0.3);
        assert!(!b.pop(0.2));
        assert!(b.pop(0.2));
        assert!(!b.pop(0.2));
        assert!(!b.pop(10.0));
    }

    #[test]
    fn test_freeze_suspends_expiry() {
        let mut b = bubble(0.1);
        b.freeze(0);
        assert!(!b.pop(5.0));
        assert!(b.is_frozen());
        assert_eq!(b.frozen_order(), Some(0));
    }

    #[test]
    fn test_frozen_bubble_does_not_drift() {
        let bounds = Rect::from_center_size(Vec2::ZERO, Vec2::splat(500.0));
        let mut b = bubble(5.0).with_drift(Vec2::new(0.0, 10.0));
        b.drift(1.0, bounds);
        assert_eq!(b.position, Vec2::new(0.0, 10.0));
        b.freeze(1);
        b.drift(1.0, bounds);
        assert_eq!(b.position, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_points_follow_palette() {
        assert_eq!(BubbleColor::Red.points(), 10);
        assert_eq!(BubbleColor::Blue.points(), 15);
        assert_eq!(BubbleColor::Purple.points(), 25);
    }
}
