//! The gameplay screen - pause wiring and menu bookkeeping.
//!
//! The gameplay systems themselves live under `crate::game` and register
//! against `OnEnter(Screen::Gameplay)` / `PausableSystems` directly.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use crate::{Pause, menus::Menu, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    // Open the pause menu on Escape.
    app.add_systems(
        Update,
        open_pause_menu.run_if(
            in_state(Screen::Gameplay)
                .and(in_state(Menu::None))
                .and(input_just_pressed(KeyCode::Escape)),
        ),
    );

    app.add_systems(OnExit(Screen::Gameplay), (close_menu, unpause));

    // Any open menu (pause, game over) freezes the round.
    app.add_systems(
        OnEnter(Menu::None),
        unpause.run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(
        OnExit(Menu::None),
        pause.run_if(in_state(Screen::Gameplay)),
    );
}

fn open_pause_menu(mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(Menu::Pause);
}

fn close_menu(mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(Menu::None);
}

fn pause(mut next_pause: ResMut<NextState<Pause>>) {
    next_pause.set(Pause(true));
}

fn unpause(mut next_pause: ResMut<NextState<Pause>>) {
    next_pause.set(Pause(false));
}
