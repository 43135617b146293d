//! The round - clock, spawner, danger ramp, and the gameplay facade.
//!
//! All gameplay state is owned by the [`GameRound`] resource. The host
//! drives it through exactly four entry points (`touch_begin`,
//! `touch_move`, `touch_end`, `tick`) and drains [`RoundEvent`]s each
//! frame; everything else in this crate is presentation reading from it.

use bevy::{prelude::*, window::PrimaryWindow};
use rand::Rng;

use super::{
    bubble::{BUBBLE_RADIUS, Bubble, BubbleColor, BubbleId, LIFETIME_RANGE},
    chain::{Advance, CHAIN_CAP, Chain},
    scoring::{EXPIRY_PENALTY, chain_payout},
};
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<GameRound>();

    app.add_message::<BubbleSpawned>();
    app.add_message::<BubbleFrozen>();
    app.add_message::<BubblePopped>();
    app.add_message::<ChainBroke>();
    app.add_message::<ChainCapped>();
    app.add_message::<RoundEnded>();

    app.add_systems(OnEnter(Screen::Gameplay), start_round);

    app.add_systems(
        Update,
        (tick_round, pump_round_events)
            .chain()
            .in_set(AppSystems::Update)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// The round ends once elapsed time exceeds this, in seconds.
pub const ROUND_DURATION: f32 = 63.5;

/// Simulated-time cadence of the spawn tick.
const SPAWN_INTERVAL: f32 = 0.5;

/// Cadence of the danger-ramp step.
const RAMP_INTERVAL: f32 = 0.1;

/// Below this much remaining time the spawner adds its third-bubble roll
/// and the danger ramp switches to the faster step.
pub const CLOSING_WINDOW: f32 = 10.0;

/// Chance of a second bubble on every spawn tick.
const EXTRA_SPAWN_CHANCE: f64 = 0.1;

/// Chance of a third bubble on spawn ticks inside the closing window.
const CLOSING_SPAWN_CHANCE: f64 = 0.7;

/// Bubbles seeded at round start.
const INITIAL_BUBBLES: usize = 4;

/// Rejection-sampling attempts when looking for an unoccupied position.
const SPAWN_ATTEMPTS: usize = 24;

/// Danger-ramp step sizes, outside and inside the closing window.
const RAMP_STEP: i32 = 10;
const RAMP_STEP_CLOSING: i32 = 20;

/// Why a bubble left the visible set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopReason {
    /// Natural expiry; costs the fixed penalty.
    Expired,
    /// Consumed by a scoring tally.
    Scored,
    /// Forfeited when its chain hit a different-colored bubble.
    ChainBroken,
}

/// Core-side event queue, drained once per frame by [`pump_round_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    Spawned(BubbleId),
    Frozen { id: BubbleId, order: u32 },
    Popped { id: BubbleId, reason: PopReason },
    ChainBroke,
    ChainCapped,
    Ended { score: i64 },
}

/// The background-tint driver: a bounded ping-pong value that reverses
/// direction at either saturation bound. Cosmetic only; it shares the
/// round clock but never feeds back into gameplay.
#[derive(Debug)]
struct DangerRamp {
    value: i32,
    direction: i32,
}

impl Default for DangerRamp {
    fn default() -> Self {
        Self { value: 0, direction: 1 }
    }
}

impl DangerRamp {
    fn step(&mut self, closing: bool) {
        let step = if closing { RAMP_STEP_CLOSING } else { RAMP_STEP };
        let next = self.value + self.direction * step;
        if next <= 0 {
            self.value = 0;
            self.direction = -self.direction;
        } else if next >= u8::MAX as i32 {
            self.value = u8::MAX as i32;
            self.direction = -self.direction;
        } else {
            self.value = next;
        }
    }

    fn channel(&self) -> u8 {
        self.value as u8
    }
}

/// One round of play.
#[derive(Resource, Debug)]
pub struct GameRound {
    bubbles: Vec<Bubble>,
    chain: Chain,
    score: i64,
    elapsed: f32,
    spawn_acc: f32,
    ramp_acc: f32,
    ramp: DangerRamp,
    next_id: BubbleId,
    ended: bool,
    events: Vec<RoundEvent>,
}

impl Default for GameRound {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRound {
    pub fn new() -> Self {
        Self {
            bubbles: Vec::new(),
            chain: Chain::default(),
            score: 0,
            elapsed: 0.0,
            spawn_acc: 0.0,
            ramp_acc: 0.0,
            ramp: DangerRamp::default(),
            next_id: 0,
            ended: false,
            events: Vec::new(),
        }
    }

    /// Seed the field with the opening burst of bubbles.
    pub fn seed(&mut self, bounds: Rect, rng: &mut impl Rng) {
        for _ in 0..INITIAL_BUBBLES {
            self.spawn_one(bounds, rng);
        }
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn remaining(&self) -> f32 {
        (ROUND_DURATION - self.elapsed).max(0.0)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn danger_channel(&self) -> u8 {
        self.ramp.channel()
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the round by one frame of `dt` seconds.
    ///
    /// Runs the expiry sweep every call, the spawn tick every 0.5s of
    /// accumulated time, and the danger ramp every 0.1s. Terminal once
    /// the round has ended: all scheduled work stops.
    pub fn tick(&mut self, dt: f32, bounds: Rect, rng: &mut impl Rng) {
        if self.ended {
            return;
        }
        self.elapsed += dt;

        for bubble in &mut self.bubbles {
            bubble.drift(dt, bounds);
        }

        // Batch-collect expired bubbles before removing any, so the
        // visible set is never mutated mid-iteration.
        let mut bursted = Vec::new();
        for bubble in &mut self.bubbles {
            if bubble.pop(dt) {
                bursted.push(bubble.id);
            }
        }
        for id in bursted {
            self.force_pop(id, PopReason::Expired);
            self.update_score(EXPIRY_PENALTY);
        }

        self.spawn_acc += dt;
        while self.spawn_acc >= SPAWN_INTERVAL {
            self.spawn_acc -= SPAWN_INTERVAL;
            if self.elapsed > ROUND_DURATION {
                self.end_round();
                return;
            }
            self.spawn_batch(bounds, rng);
        }

        self.ramp_acc += dt;
        while self.ramp_acc >= RAMP_INTERVAL {
            self.ramp_acc -= RAMP_INTERVAL;
            self.ramp.step(self.remaining() < CLOSING_WINDOW);
        }
    }

    /// Touch-begin: try to anchor a chain at `point`.
    pub fn touch_begin(&mut self, point: Vec2) {
        if self.ended {
            return;
        }
        if let Some(id) = self.chain.begin(point, &mut self.bubbles) {
            self.events.push(RoundEvent::Frozen { id, order: 0 });
        }
    }

    /// Touch-move: grow or break the active chain with one sample.
    pub fn touch_move(&mut self, point: Vec2) {
        if self.ended {
            return;
        }
        match self.chain.advance(point, &mut self.bubbles) {
            Advance::Idle => {}
            Advance::Extended { frozen } => {
                for id in frozen {
                    let order = self
                        .bubble(id)
                        .and_then(|b| b.frozen_order())
                        .unwrap_or_default();
                    self.events.push(RoundEvent::Frozen { id, order });
                }
                if self.chain.len() >= CHAIN_CAP {
                    self.events.push(RoundEvent::ChainCapped);
                    self.tally();
                }
            }
            Advance::Broken { victims } => {
                for id in victims {
                    self.force_pop(id, PopReason::ChainBroken);
                }
                self.events.push(RoundEvent::ChainBroke);
                info!("Chain broken, score unchanged at {}", self.score);
            }
        }
    }

    /// Touch-end: consume the chain, if one is anchored.
    pub fn touch_end(&mut self) {
        if self.ended || !self.chain.is_active() {
            return;
        }
        self.tally();
    }

    /// Consume the chain: pop every member, apply the multiplier-weighted
    /// payout, and reset the gesture.
    fn tally(&mut self) {
        if !self.chain.is_active() {
            return;
        }
        let len = self.chain.len();
        let links = self.chain.links().to_vec();
        let raw: i64 = links
            .iter()
            .filter_map(|id| self.bubble(*id))
            .map(|b| b.points())
            .sum();
        for id in links {
            self.force_pop(id, PopReason::Scored);
        }
        let delta = chain_payout(raw, len);
        self.update_score(delta);
        self.chain.clear();
        info!("Tallied chain of {len}: +{delta} (total {})", self.score);
    }

    /// Remove a bubble from the visible set immediately, regardless of its
    /// countdown. Safe no-op when the bubble is already gone.
    fn force_pop(&mut self, id: BubbleId, reason: PopReason) {
        if let Some(index) = self.bubbles.iter().position(|b| b.id == id) {
            self.bubbles.swap_remove(index);
            self.events.push(RoundEvent::Popped { id, reason });
        }
    }

    fn update_score(&mut self, delta: i64) {
        self.score += delta;
    }

    fn spawn_batch(&mut self, bounds: Rect, rng: &mut impl Rng) {
        let second = rng.random_bool(EXTRA_SPAWN_CHANCE);
        let third = rng.random_bool(CLOSING_SPAWN_CHANCE);
        for _ in 0..planned_spawns(self.remaining(), second, third) {
            self.spawn_one(bounds, rng);
        }
    }

    fn spawn_one(&mut self, bounds: Rect, rng: &mut impl Rng) {
        let Some(position) = self.open_position(bounds, rng) else {
            return;
        };
        let id = self.next_id;
        self.next_id += 1;
        let bubble = Bubble::new(
            id,
            BubbleColor::random(rng),
            position,
            rng.random_range(LIFETIME_RANGE),
        )
        .with_drift(Vec2::new(
            rng.random_range(-12.0..12.0),
            rng.random_range(4.0..18.0),
        ));
        self.bubbles.push(bubble);
        self.events.push(RoundEvent::Spawned(id));
    }

    /// Find a random position inside `bounds` at least one diameter away
    /// from every live bubble. Gives up after a bounded number of
    /// attempts when the field is saturated.
    fn open_position(&self, bounds: Rect, rng: &mut impl Rng) -> Option<Vec2> {
        let min = bounds.min + Vec2::splat(BUBBLE_RADIUS);
        let max = bounds.max - Vec2::splat(BUBBLE_RADIUS);
        if min.x >= max.x || min.y >= max.y {
            return None;
        }
        let clearance = (2.0 * BUBBLE_RADIUS) * (2.0 * BUBBLE_RADIUS);
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = Vec2::new(
                rng.random_range(min.x..max.x),
                rng.random_range(min.y..max.y),
            );
            if self
                .bubbles
                .iter()
                .all(|b| candidate.distance_squared(b.position) >= clearance)
            {
                return Some(candidate);
            }
        }
        None
    }

    /// Terminal transition: cancels all scheduled work and clears an
    /// active chain without scoring it.
    fn end_round(&mut self) {
        self.chain.clear();
        self.ended = true;
        self.events.push(RoundEvent::Ended { score: self.score });
        info!("Round over: final score {}", self.score);
    }
}

/// How many bubbles one spawn tick produces, given the probability rolls:
/// always one, a second on a 10% roll, and - inside the closing window -
/// a third on a 70% roll.
fn planned_spawns(remaining: f32, second: bool, third: bool) -> usize {
    1 + usize::from(second) + usize::from(remaining < CLOSING_WINDOW && third)
}

/// Message mirrors of [`RoundEvent`], for the presentation modules.
#[derive(Message, Debug, Clone)]
pub struct BubbleSpawned {
    pub id: BubbleId,
}

#[derive(Message, Debug, Clone)]
pub struct BubbleFrozen {
    pub id: BubbleId,
    pub order: u32,
}

#[derive(Message, Debug, Clone)]
pub struct BubblePopped {
    pub id: BubbleId,
    #[allow(dead_code)]
    pub reason: PopReason,
}

#[derive(Message, Debug, Clone)]
pub struct ChainBroke;

#[derive(Message, Debug, Clone)]
pub struct ChainCapped;

#[derive(Message, Debug, Clone)]
pub struct RoundEnded {
    pub score: i64,
}

/// The spawn region supplied by the host window, inset so bubbles stay
/// clear of the screen edges and the HUD band along the top.
pub fn play_area(window: Option<&Window>) -> Rect {
    const EDGE_MARGIN: f32 = 40.0;
    const HUD_MARGIN: f32 = 110.0;

    let size = window.map_or(Vec2::new(1280.0, 720.0), |w| Vec2::new(w.width(), w.height()));
    let half = size / 2.0;
    Rect {
        min: Vec2::new(-half.x + EDGE_MARGIN, -half.y + EDGE_MARGIN),
        max: Vec2::new(half.x - EDGE_MARGIN, half.y - HUD_MARGIN),
    }
}

/// Reset the round and seed the opening bubbles when gameplay starts.
fn start_round(mut round: ResMut<GameRound>, window: Query<&Window, With<PrimaryWindow>>) {
    let bounds = play_area(window.single().ok());
    *round = GameRound::new();
    round.seed(bounds, &mut rand::rng());
    info!("Round started with {} bubbles", round.bubbles().len());
}

/// Drive the round with frame time.
fn tick_round(
    time: Res<Time>,
    mut round: ResMut<GameRound>,
    window: Query<&Window, With<PrimaryWindow>>,
) {
    let bounds = play_area(window.single().ok());
    round.tick(time.delta_secs(), bounds, &mut rand::rng());
}

/// Forward the core's drained events as messages.
fn pump_round_events(
    mut round: ResMut<GameRound>,
    mut spawned: MessageWriter<BubbleSpawned>,
    mut frozen: MessageWriter<BubbleFrozen>,
    mut popped: MessageWriter<BubblePopped>,
    mut broke: MessageWriter<ChainBroke>,
    mut capped: MessageWriter<ChainCapped>,
    mut ended: MessageWriter<RoundEnded>,
) {
    for event in round.drain_events() {
        match event {
            RoundEvent::Spawned(id) => {
                spawned.write(BubbleSpawned { id });
            }
            RoundEvent::Frozen { id, order } => {
                frozen.write(BubbleFrozen { id, order });
            }
            RoundEvent::Popped { id, reason } => {
                popped.write(BubblePopped { id, reason });
            }
            RoundEvent::ChainBroke => {
                broke.write(ChainBroke);
            }
            RoundEvent::ChainCapped => {
                capped.write(ChainCapped);
            }
            RoundEvent::Ended { score } => {
                ended.write(RoundEnded { score });
            }
        }
    }
}

#[cfg(test)]
impl GameRound {
    fn inject(&mut self, bubble: Bubble) {
        self.next_id = self.next_id.max(bubble.id + 1);
        self.bubbles.push(bubble);
    }

    fn set_elapsed(&mut self, elapsed: f32) {
        self.elapsed = elapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn bounds() -> Rect {
        Rect::from_center_size(Vec2::ZERO, Vec2::splat(4000.0))
    }

    fn red(id: BubbleId, x: f32) -> Bubble {
        Bubble::new(id, BubbleColor::Red, Vec2::new(x, 0.0), 60.0)
    }

    #[test]
    fn test_single_bubble_tap_scores_flat_bonus() {
        let mut round = GameRound::new();
        round.inject(red(1, 0.0));

        round.touch_begin(Vec2::ZERO);
        round.touch_end();

        assert_eq!(round.score(), 20);
        assert!(round.bubbles().is_empty());
        assert!(!round.chain().is_active());
    }

    #[test]
    fn test_chain_of_three_scores_multiplied_sum() {
        let mut round = GameRound::new();
        round.inject(red(1, 0.0));
        round.inject(red(2, 100.0));
        round.inject(Bubble::new(3, BubbleColor::Blue, Vec2::new(500.0, 0.0), 60.0));
        round.inject(red(4, 200.0));

        round.touch_begin(Vec2::ZERO);
        round.touch_move(Vec2::new(100.0, 0.0));
        round.touch_move(Vec2::new(200.0, 0.0));
        round.touch_end();

        // 10 + 10 + 10 at length 3 -> 30 * 2. The blue bystander stays.
        assert_eq!(round.score(), 60);
        assert_eq!(round.bubbles().len(), 1);
        assert_eq!(round.bubbles()[0].id, 3);
    }

    #[test]
    fn test_mismatch_force_pops_chain_for_nothing() {
        let mut round = GameRound::new();
        round.inject(red(1, 0.0));
        round.inject(red(2, 100.0));
        round.inject(Bubble::new(3, BubbleColor::Blue, Vec2::new(200.0, 0.0), 60.0));

        round.touch_begin(Vec2::ZERO);
        round.touch_move(Vec2::new(100.0, 0.0));
        round.touch_move(Vec2::new(200.0, 0.0));

        let events = round.drain_events();
        let popped: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RoundEvent::Popped { reason: PopReason::ChainBroken, .. }))
            .collect();
        assert_eq!(popped.len(), 2);
        assert_eq!(round.score(), 0);
        assert!(!round.chain().is_active());
        // The mismatched bubble itself survives.
        assert_eq!(round.bubbles().len(), 1);

        // Ending the dead gesture is a no-op.
        round.touch_end();
        assert_eq!(round.score(), 0);
    }

    #[test]
    fn test_chain_caps_at_six_and_auto_tallies() {
        let mut round = GameRound::new();
        for i in 0..7 {
            round.inject(red(i, i as f32 * 100.0));
        }

        round.touch_begin(Vec2::ZERO);
        for i in 1..6 {
            round.touch_move(Vec2::new(i as f32 * 100.0, 0.0));
        }

        // Tally fired on the sixth freeze, before touch-end.
        assert_eq!(round.score(), 60 * 5);
        assert!(!round.chain().is_active());
        assert_eq!(round.bubbles().len(), 1);
        let events = round.drain_events();
        assert!(events.contains(&RoundEvent::ChainCapped));
    }

    #[test]
    fn test_expiry_penalizes_and_removes_one_bubble() {
        let mut round = GameRound::new();
        round.inject(Bubble::new(1, BubbleColor::Red, Vec2::ZERO, 0.3));

        round.tick(0.4, bounds(), &mut rng());

        assert_eq!(round.score(), -10);
        assert!(round.bubbles().is_empty());
        let events = round.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RoundEvent::Popped { reason: PopReason::Expired, .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_frozen_bubble_never_expires() {
        let mut round = GameRound::new();
        round.inject(Bubble::new(1, BubbleColor::Red, Vec2::ZERO, 0.2));

        round.touch_begin(Vec2::ZERO);
        round.tick(0.4, bounds(), &mut rng());
        round.tick(0.4, bounds(), &mut rng());

        assert!(round.bubble(1).is_some());
        let events = round.drain_events();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, RoundEvent::Popped { id: 1, .. }))
        );
    }

    #[test]
    fn test_spawn_tick_cadence() {
        let mut round = GameRound::new();
        let mut r = rng();

        round.tick(0.4, bounds(), &mut r);
        assert!(round.bubbles().is_empty());

        round.tick(0.2, bounds(), &mut r);
        // One guaranteed spawn, at most one 10% extra outside the
        // closing window.
        let spawned = round.bubbles().len();
        assert!((1..=2).contains(&spawned));
    }

    #[test]
    fn test_planned_spawns_probability_branches() {
        assert_eq!(planned_spawns(30.0, false, false), 1);
        assert_eq!(planned_spawns(30.0, true, false), 2);
        // The third-bubble branch is unreachable until the closing window.
        assert_eq!(planned_spawns(30.0, true, true), 2);
        assert_eq!(planned_spawns(9.9, false, true), 2);
        assert_eq!(planned_spawns(9.9, true, true), 3);
    }

    #[test]
    fn test_round_ends_exactly_once() {
        let mut round = GameRound::new();
        round.set_elapsed(ROUND_DURATION - 0.1);

        round.tick(0.5, bounds(), &mut rng());

        assert!(round.is_ended());
        let events = round.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RoundEvent::Ended { .. }))
                .count(),
            1
        );
        assert!(!events.iter().any(|e| matches!(e, RoundEvent::Spawned(_))));

        // Everything is cancelled: further ticks and touches do nothing.
        round.tick(5.0, bounds(), &mut rng());
        round.touch_begin(Vec2::ZERO);
        round.touch_end();
        assert!(round.drain_events().is_empty());
        assert_eq!(round.remaining(), 0.0);
    }

    #[test]
    fn test_round_end_clears_chain_without_scoring() {
        let mut round = GameRound::new();
        round.inject(red(1, 0.0));
        round.inject(red(2, 100.0));
        round.touch_begin(Vec2::ZERO);
        round.touch_move(Vec2::new(100.0, 0.0));

        round.set_elapsed(ROUND_DURATION + 0.1);
        round.tick(0.5, bounds(), &mut rng());

        assert!(round.is_ended());
        assert_eq!(round.score(), 0);
        assert!(!round.chain().is_active());
    }

    #[test]
    fn test_danger_ramp_cadence_and_closing_step() {
        let mut round = GameRound::new();
        round.tick(0.35, bounds(), &mut rng());
        // Three 0.1s steps of 10 outside the closing window.
        assert_eq!(round.danger_channel(), 30);

        let mut closing = GameRound::new();
        closing.set_elapsed(ROUND_DURATION - 5.0);
        closing.tick(0.35, bounds(), &mut rng());
        assert_eq!(closing.danger_channel(), 60);
    }

    #[test]
    fn test_danger_ramp_ping_pongs_at_bounds() {
        let mut ramp = DangerRamp::default();
        for _ in 0..40 {
            ramp.step(false);
        }
        // 0 -> 250 -> 255 (26 steps), then back down.
        assert!(ramp.value <= u8::MAX as i32);
        assert!(ramp.value >= 0);
        assert_eq!(ramp.direction, -1);

        let mut floor = DangerRamp { value: 5, direction: -1 };
        floor.step(false);
        assert_eq!(floor.channel(), 0);
        assert_eq!(floor.direction, 1);
    }

    #[test]
    fn test_spawn_skipped_when_no_open_position() {
        let mut round = GameRound::new();
        // A field far smaller than one bubble's clearance.
        let tiny = Rect::from_center_size(Vec2::ZERO, Vec2::splat(10.0));
        round.seed(tiny, &mut rng());
        assert!(round.bubbles().is_empty());
        assert!(round.drain_events().is_empty());
    }
}
