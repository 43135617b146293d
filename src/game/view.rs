//! Gameplay visuals - bubble sprites, the chain line, pop animation, and
//! the danger-ramp background tint.
//!
//! Everything here mirrors state owned by [`GameRound`]; nothing feeds
//! back into gameplay.

use bevy::prelude::*;

use super::{
    bubble::BubbleId,
    round::{BubbleFrozen, BubblePopped, BubbleSpawned, ChainBroke, ChainCapped, GameRound},
};
use crate::{
    PausableSystems,
    audio::{pitched_sound_effect, sound_effect},
    screens::Screen,
    theme::palette::BACKDROP,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            spawn_bubble_visuals,
            sync_bubble_visuals,
            pop_on_messages,
            animate_pop,
            play_gesture_cues,
            draw_chain_line,
            apply_danger_tint,
        )
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    app.add_systems(OnExit(Screen::Gameplay), reset_background);
}

/// How much a frozen bubble swells per chain position, as a visual cue
/// proportional to its freeze order.
const FREEZE_SWELL: f32 = 0.06;

/// Marker tying a visual entity to a core bubble.
#[derive(Component, Debug)]
struct BubbleVisual(BubbleId);

/// Spawn a circle mesh for every bubble the core reports.
fn spawn_bubble_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    round: Res<GameRound>,
    mut spawned: MessageReader<BubbleSpawned>,
) {
    for message in spawned.read() {
        // Gone again already (popped in the same frame it spawned).
        let Some(bubble) = round.bubble(message.id) else {
            continue;
        };
        commands.spawn((
            Name::new(format!("Bubble {}", bubble.id)),
            BubbleVisual(bubble.id),
            Transform::from_translation(bubble.position.extend(0.0)),
            Mesh2d(meshes.add(Circle::new(bubble.radius))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(bubble.color.to_color()))),
            DespawnOnExit(Screen::Gameplay),
        ));
    }
}

/// Follow the core's positions and swell frozen bubbles by chain order.
fn sync_bubble_visuals(
    round: Res<GameRound>,
    mut visuals: Query<(&BubbleVisual, &mut Transform), Without<PopAnimation>>,
) {
    for (visual, mut transform) in &mut visuals {
        // Mid-pop visuals are owned by their animation.
        let Some(bubble) = round.bubble(visual.0) else {
            continue;
        };
        transform.translation = bubble.position.extend(0.0);
        let scale = match bubble.frozen_order() {
            Some(order) => 1.0 + FREEZE_SWELL * (order as f32 + 1.0),
            None => 1.0,
        };
        transform.scale = Vec3::splat(scale);
    }
}

/// Start the pop animation for bubbles the core has removed.
fn pop_on_messages(
    mut commands: Commands,
    mut popped: MessageReader<BubblePopped>,
    visuals: Query<(Entity, &BubbleVisual, &Transform)>,
) {
    for message in popped.read() {
        for (entity, visual, transform) in &visuals {
            if visual.0 == message.id {
                commands
                    .entity(entity)
                    .insert(PopAnimation::new(transform.scale));
            }
        }
    }
}

/// Component for bubbles that are popping (swell up, then shrink away).
#[derive(Component)]
struct PopAnimation {
    /// Time elapsed in the animation.
    timer: f32,
    /// Total animation duration.
    duration: f32,
    /// Starting scale.
    start_scale: Vec3,
    /// Target scale at peak.
    peak_scale: Vec3,
}

impl PopAnimation {
    fn new(current_scale: Vec3) -> Self {
        Self {
            timer: 0.0,
            duration: 0.15,
            start_scale: current_scale,
            peak_scale: current_scale * 1.4,
        }
    }
}

/// Animate popping bubbles and despawn when done.
fn animate_pop(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut PopAnimation)>,
) {
    for (entity, mut transform, mut pop) in &mut query {
        pop.timer += time.delta_secs();
        let progress = (pop.timer / pop.duration).min(1.0);

        // Scale up quickly, then shrink to nothing.
        let scale = if progress < 0.5 {
            let t = progress * 2.0;
            pop.start_scale.lerp(pop.peak_scale, t)
        } else {
            let t = (progress - 0.5) * 2.0;
            pop.peak_scale.lerp(Vec3::ZERO, t)
        };

        transform.scale = scale;

        if progress >= 1.0 {
            commands.entity(entity).despawn();
        }
    }
}

/// Fire-and-forget audio cues for gesture milestones.
fn play_gesture_cues(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut frozen: MessageReader<BubbleFrozen>,
    mut capped: MessageReader<ChainCapped>,
    mut broke: MessageReader<ChainBroke>,
) {
    for message in frozen.read() {
        let freeze_sound = asset_server.load("audio/sound_effects/freeze.ogg");
        // Pitch climbs with the chain.
        commands.spawn(pitched_sound_effect(
            freeze_sound,
            1.0 + 0.1 * message.order as f32,
        ));
    }
    for _ in capped.read() {
        let capped_sound = asset_server.load("audio/sound_effects/chain_full.ogg");
        commands.spawn(sound_effect(capped_sound));
    }
    for _ in broke.read() {
        let broke_sound = asset_server.load("audio/sound_effects/fizzle.ogg");
        commands.spawn(sound_effect(broke_sound));
    }
}

/// Draw the connective line through the gesture's sampled path, in the
/// anchor's color. Visual feedback only.
fn draw_chain_line(mut gizmos: Gizmos, round: Res<GameRound>) {
    let Some(color) = round.chain().color() else {
        return;
    };
    for pair in round.chain().path().windows(2) {
        gizmos.line_2d(pair[0], pair[1], color.to_color());
    }
}

/// Drive the background clear color from the danger channel.
fn apply_danger_tint(round: Res<GameRound>, mut clear_color: ResMut<ClearColor>) {
    clear_color.0 = Color::srgb_u8(round.danger_channel(), 200, 205);
}

fn reset_background(mut clear_color: ResMut<ClearColor>) {
    clear_color.0 = BACKDROP;
}
