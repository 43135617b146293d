//! The game over menu.
//!
//! Opens when the round clock runs out, carrying the final cumulative
//! score out of the round.

use bevy::prelude::*;

use crate::{
    game::{PlayerRecords, RoundEnded},
    menus::Menu,
    screens::Screen,
    theme::widget,
};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<FinalScore>();

    app.add_systems(
        Update,
        open_on_round_end.run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(OnEnter(Menu::GameOver), spawn_gameover_menu);
}

/// The score carried from the finished round into the menu.
#[derive(Resource, Debug, Default)]
struct FinalScore(i64);

fn open_on_round_end(
    mut ended: MessageReader<RoundEnded>,
    mut final_score: ResMut<FinalScore>,
    mut next_menu: ResMut<NextState<Menu>>,
) {
    for message in ended.read() {
        final_score.0 = message.score;
        next_menu.set(Menu::GameOver);
    }
}

fn spawn_gameover_menu(
    mut commands: Commands,
    final_score: Res<FinalScore>,
    records: Res<PlayerRecords>,
) {
    commands.spawn((
        widget::ui_root("Game Over Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::GameOver),
        children![
            widget::header("Game Over"),
            widget::label(format!("Score: {}", final_score.0)),
            widget::label(format!("Best: {}", records.top_score)),
            widget::button("Quit to title", quit_to_title),
        ],
    ));
}

fn quit_to_title(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Title);
}
