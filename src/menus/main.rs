//! The main menu (seen on the title screen).

use bevy::prelude::*;

use crate::{game::PlayerRecords, menus::Menu, screens::Screen, theme::widget};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::Main), spawn_main_menu);
}

fn spawn_main_menu(mut commands: Commands, records: Res<PlayerRecords>) {
    // First-timers get the one-line rules instead of a best score.
    let subtitle = if records.first_run {
        "Drag across matching bubbles to chain them, release to pop".to_string()
    } else {
        format!("Best: {}", records.top_score)
    };

    commands.spawn((
        widget::ui_root("Main Menu"),
        GlobalZIndex(2),
        DespawnOnExit(Menu::Main),
        #[cfg(not(target_family = "wasm"))]
        children![
            widget::header("Popchain"),
            widget::label(subtitle),
            widget::button("Play", enter_gameplay_screen),
            widget::button("Exit", exit_app),
        ],
        #[cfg(target_family = "wasm")]
        children![
            widget::header("Popchain"),
            widget::label(subtitle),
            widget::button("Play", enter_gameplay_screen),
        ],
    ));
}

fn enter_gameplay_screen(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Gameplay);
}

#[cfg(not(target_family = "wasm"))]
fn exit_app(_: On<Pointer<Click>>, mut app_exit: MessageWriter<AppExit>) {
    app_exit.write(AppExit::Success);
}
