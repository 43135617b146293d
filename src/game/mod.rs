//! The main game module for the chain-pop arcade loop.
//!
//! This module contains all the gameplay logic including:
//! - Bubble lifecycle (spawn, drift, expiry)
//! - Chain tracking and color matching for the drag gesture
//! - Multiplier-weighted scoring
//! - The round clock, escalating spawner, and danger ramp
//! - High score persistence
//!
//! The core state machine lives in the [`round::GameRound`] resource and
//! is driven purely through `touch_begin` / `touch_move` / `touch_end`
//! and `tick`; the remaining modules are thin drivers and presentation.

mod bubble;
mod chain;
mod highscore;
mod hud;
mod input;
mod round;
mod scoring;
mod view;

use bevy::prelude::*;

pub use highscore::PlayerRecords;
pub use round::RoundEnded;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        round::plugin,
        input::plugin,
        view::plugin,
        hud::plugin,
        highscore::plugin,
    ));
}
