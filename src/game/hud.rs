//! In-round labels - score, multiplier, and the countdown.

use bevy::prelude::*;

use super::{highscore::PlayerRecords, round::GameRound, scoring::ScoreTone};
use crate::{
    screens::Screen,
    theme::palette::{SCORE_NEUTRAL, SCORE_PENALTY, SCORE_RECORD},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_hud);
    app.add_systems(
        Update,
        (update_score_label, update_multiplier_label, update_countdown_label)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Multiplier font size at the smallest displayed chain; emphasis grows
/// from here with chain length.
const MULTIPLIER_BASE_FONT: f32 = 48.0;

#[derive(Component)]
struct ScoreLabel;

#[derive(Component)]
struct MultiplierLabel;

#[derive(Component)]
struct CountdownLabel;

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Name::new("Score Banner"),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(18.0),
            left: Val::Px(0.0),
            right: Val::Px(0.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        Pickable::IGNORE,
        DespawnOnExit(Screen::Gameplay),
        children![(
            Name::new("Score"),
            ScoreLabel,
            Text::new("0"),
            TextFont::from_font_size(48.0),
            TextColor(SCORE_NEUTRAL),
        )],
    ));

    commands.spawn((
        Name::new("Countdown"),
        CountdownLabel,
        Text::new("63.5"),
        TextFont::from_font_size(36.0),
        TextColor(SCORE_NEUTRAL),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(24.0),
            left: Val::Px(32.0),
            ..default()
        },
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.spawn((
        Name::new("Multiplier"),
        MultiplierLabel,
        Text::new(""),
        TextFont::from_font_size(MULTIPLIER_BASE_FONT),
        TextColor(SCORE_NEUTRAL),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(24.0),
            right: Val::Px(32.0),
            ..default()
        },
        DespawnOnExit(Screen::Gameplay),
    ));
}

/// Recolor the score by how it reads against the persisted record.
fn update_score_label(
    round: Res<GameRound>,
    records: Res<PlayerRecords>,
    mut label: Query<(&mut Text, &mut TextColor), With<ScoreLabel>>,
) {
    let Ok((mut text, mut color)) = label.single_mut() else {
        return;
    };
    text.0 = round.score().to_string();
    color.0 = match ScoreTone::classify(round.score(), records.top_score) {
        ScoreTone::Record => SCORE_RECORD,
        ScoreTone::Penalty => SCORE_PENALTY,
        ScoreTone::Neutral => SCORE_NEUTRAL,
    };
}

/// Show `(len - 1)x` while at least two bubbles are chained, growing the
/// font with the chain.
fn update_multiplier_label(
    round: Res<GameRound>,
    mut label: Query<(&mut Text, &mut TextFont), With<MultiplierLabel>>,
) {
    let Ok((mut text, mut font)) = label.single_mut() else {
        return;
    };
    match round.chain().multiplier_display() {
        Some(multiplier) => {
            text.0 = format!("{multiplier}x");
            font.font_size = MULTIPLIER_BASE_FONT + 2.0 * round.chain().len() as f32;
        }
        None => text.0.clear(),
    }
}

/// Remaining time with one-decimal precision.
fn update_countdown_label(
    round: Res<GameRound>,
    mut label: Query<&mut Text, With<CountdownLabel>>,
) {
    let Ok(mut text) = label.single_mut() else {
        return;
    };
    text.0 = format!("{:04.1}", round.remaining());
}
