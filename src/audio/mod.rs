//! Fire-and-forget audio playback helpers.
//!
//! The game emits symbolic cues (freeze, chain capped, chain broken);
//! these bundles own the actual playback and clean up after themselves.

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Music>();
    app.register_type::<SoundEffect>();
}

/// An organizational marker component for music.
#[derive(Component, Default, Reflect)]
#[reflect(Component)]
pub struct Music;

/// A looping music audio instance.
#[allow(dead_code)]
pub fn music(handle: Handle<AudioSource>) -> impl Bundle {
    (AudioPlayer(handle), PlaybackSettings::LOOP, Music)
}

/// An organizational marker component for sound effects.
#[derive(Component, Default, Reflect)]
#[reflect(Component)]
pub struct SoundEffect;

/// A one-shot sound effect that despawns itself after playing.
pub fn sound_effect(handle: Handle<AudioSource>) -> impl Bundle {
    (AudioPlayer(handle), PlaybackSettings::DESPAWN, SoundEffect)
}

/// A one-shot sound effect with adjusted playback speed, for cues whose
/// pitch scales with an in-game quantity.
pub fn pitched_sound_effect(handle: Handle<AudioSource>, speed: f32) -> impl Bundle {
    (
        AudioPlayer(handle),
        PlaybackSettings::DESPAWN.with_speed(speed),
        SoundEffect,
    )
}
