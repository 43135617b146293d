//! Chain tracking - the one-gesture state machine.
//!
//! A gesture anchors on the first bubble touched, then grows by dragging
//! across same-colored, unfrozen bubbles. Touching any bubble of another
//! color breaks the chain and forfeits every frozen member.

use bevy::prelude::*;

use super::bubble::{Bubble, BubbleColor, BubbleId};

/// Chains auto-tally the moment they reach this length, within the same
/// input sample that grew them. Caps the multiplier and guarantees the
/// gesture terminates.
pub const CHAIN_CAP: usize = 6;

/// Outcome of feeding one touch-move sample into the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// No anchor, or the sample hit nothing actionable.
    Idle,
    /// New members were frozen onto the chain, in id order.
    Extended { frozen: Vec<BubbleId> },
    /// The sample hit a bubble of another color. The chain is cleared;
    /// the previous members are returned for force-popping.
    Broken { victims: Vec<BubbleId> },
}

/// The ordered set of currently-frozen bubbles for the active gesture.
///
/// Insertion order is freeze order; the anchor (first element) defines the
/// required color. Length 0 means no active gesture.
#[derive(Debug, Default)]
pub struct Chain {
    links: Vec<BubbleId>,
    color: Option<BubbleColor>,
    path: Vec<Vec2>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_active(&self) -> bool {
        !self.links.is_empty()
    }

    /// The anchor's color, while a gesture is active.
    pub fn color(&self) -> Option<BubbleColor> {
        self.color
    }

    pub fn links(&self) -> &[BubbleId] {
        &self.links
    }

    /// Sampled pointer path, for drawing the connective line. Visual
    /// feedback only; not scoring-relevant.
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    /// The multiplier shown while dragging: `(len - 1)x` once at least
    /// two bubbles are chained.
    pub fn multiplier_display(&self) -> Option<i64> {
        (self.len() >= 2).then(|| self.len() as i64 - 1)
    }

    /// Touch-begin: anchor on the lowest-id visible bubble containing
    /// `point`, freezing it with order 0. No-op if nothing is hit or a
    /// gesture is already active.
    pub fn begin(&mut self, point: Vec2, bubbles: &mut [Bubble]) -> Option<BubbleId> {
        if self.is_active() {
            return None;
        }

        let anchor = bubbles
            .iter_mut()
            .filter(|b| b.contains_point(point))
            .min_by_key(|b| b.id)?;

        anchor.freeze(0);
        self.links.push(anchor.id);
        self.color = Some(anchor.color);
        self.path.clear();
        self.path.push(point);
        Some(anchor.id)
    }

    /// Touch-move: extend or break the chain with one sample point.
    ///
    /// A hit on a different-colored bubble takes priority over extension.
    /// Every same-colored, unfrozen bubble containing the point is frozen
    /// at the next sequential order; overlapping bubbles may join in one
    /// sample.
    pub fn advance(&mut self, point: Vec2, bubbles: &mut [Bubble]) -> Advance {
        let Some(color) = self.color else {
            return Advance::Idle;
        };

        self.path.push(point);

        let mismatch = bubbles
            .iter()
            .any(|b| b.contains_point(point) && b.color != color);
        if mismatch {
            let victims = std::mem::take(&mut self.links);
            self.color = None;
            self.path.clear();
            return Advance::Broken { victims };
        }

        let mut hits: Vec<&mut Bubble> = bubbles
            .iter_mut()
            .filter(|b| b.contains_point(point) && b.color == color && !b.is_frozen())
            .collect();
        hits.sort_by_key(|b| b.id);

        if hits.is_empty() {
            return Advance::Idle;
        }

        let mut frozen = Vec::with_capacity(hits.len());
        for bubble in hits {
            bubble.freeze(self.links.len() as u32);
            self.links.push(bubble.id);
            frozen.push(bubble.id);
        }
        Advance::Extended { frozen }
    }

    /// Drop all gesture state. Does not touch the bubbles themselves;
    /// the caller decides whether the members are popped or released.
    pub fn clear(&mut self) {
        self.links.clear();
        self.color = None;
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Vec<Bubble> {
        vec![
            Bubble::new(1, BubbleColor::Red, Vec2::new(0.0, 0.0), 60.0),
            Bubble::new(2, BubbleColor::Red, Vec2::new(100.0, 0.0), 60.0),
            Bubble::new(3, BubbleColor::Blue, Vec2::new(200.0, 0.0), 60.0),
            Bubble::new(4, BubbleColor::Red, Vec2::new(300.0, 0.0), 60.0),
        ]
    }

    #[test]
    fn test_begin_anchors_lowest_id() {
        let mut bubbles = field();
        // Bubble 5 overlaps bubble 1's position exactly.
        bubbles.push(Bubble::new(5, BubbleColor::Blue, Vec2::ZERO, 60.0));

        let mut chain = Chain::default();
        assert_eq!(chain.begin(Vec2::ZERO, &mut bubbles), Some(1));
        assert_eq!(chain.color(), Some(BubbleColor::Red));
        assert_eq!(bubbles[0].frozen_order(), Some(0));
    }

    #[test]
    fn test_begin_misses_are_noops() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        assert_eq!(chain.begin(Vec2::new(-500.0, 0.0), &mut bubbles), None);
        assert!(!chain.is_active());
    }

    #[test]
    fn test_begin_while_active_is_noop() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);
        assert_eq!(chain.begin(Vec2::new(100.0, 0.0), &mut bubbles), None);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_advance_extends_matching_color() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);

        let out = chain.advance(Vec2::new(100.0, 0.0), &mut bubbles);
        assert_eq!(out, Advance::Extended { frozen: vec![2] });
        assert_eq!(chain.len(), 2);
        assert_eq!(bubbles[1].frozen_order(), Some(1));
        assert_eq!(chain.multiplier_display(), Some(1));
    }

    #[test]
    fn test_advance_ignores_empty_space_and_frozen() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);

        assert_eq!(chain.advance(Vec2::new(-500.0, 0.0), &mut bubbles), Advance::Idle);
        // Re-touching the frozen anchor adds nothing.
        assert_eq!(chain.advance(Vec2::ZERO, &mut bubbles), Advance::Idle);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_mismatch_breaks_chain() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);
        chain.advance(Vec2::new(100.0, 0.0), &mut bubbles);

        let out = chain.advance(Vec2::new(200.0, 0.0), &mut bubbles);
        assert_eq!(out, Advance::Broken { victims: vec![1, 2] });
        assert!(!chain.is_active());
        assert_eq!(chain.multiplier_display(), None);
    }

    #[test]
    fn test_mismatch_takes_priority_over_extension() {
        let mut bubbles = field();
        // A red and a blue bubble share a spot; touching it must break.
        bubbles.push(Bubble::new(6, BubbleColor::Blue, Vec2::new(300.0, 0.0), 60.0));

        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);
        let out = chain.advance(Vec2::new(300.0, 0.0), &mut bubbles);
        assert!(matches!(out, Advance::Broken { .. }));
    }

    #[test]
    fn test_overlapping_hits_join_in_one_sample() {
        let mut bubbles = field();
        // Two more reds stacked on bubble 2's position; ids out of order.
        bubbles.push(Bubble::new(9, BubbleColor::Red, Vec2::new(100.0, 0.0), 60.0));
        bubbles.push(Bubble::new(7, BubbleColor::Red, Vec2::new(100.0, 0.0), 60.0));

        let mut chain = Chain::default();
        chain.begin(Vec2::ZERO, &mut bubbles);
        let out = chain.advance(Vec2::new(100.0, 0.0), &mut bubbles);
        assert_eq!(out, Advance::Extended { frozen: vec![2, 7, 9] });
        assert_eq!(chain.links(), &[1, 2, 7, 9]);
    }

    #[test]
    fn test_advance_without_anchor_is_noop() {
        let mut bubbles = field();
        let mut chain = Chain::default();
        assert_eq!(chain.advance(Vec2::ZERO, &mut bubbles), Advance::Idle);
    }
}
