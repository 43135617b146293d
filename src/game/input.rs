//! Pointer input - translating mouse drags and touches into gesture calls.
//!
//! The round only understands `touch_begin` / `touch_move` / `touch_end`;
//! these systems are the whole input surface. Samples with no usable
//! pointer position are ignored.

use bevy::{prelude::*, window::PrimaryWindow};

use super::round::GameRound;
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (handle_mouse_gesture, handle_touch_gesture)
            .in_set(AppSystems::RecordInput)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

fn handle_mouse_gesture(
    mouse: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut round: ResMut<GameRound>,
) {
    if round.is_ended() {
        return;
    }

    if mouse.just_released(MouseButton::Left) {
        round.touch_end();
        return;
    }

    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Some(point) = window
        .cursor_position()
        .and_then(|p| camera.viewport_to_world_2d(camera_transform, p).ok())
    else {
        return;
    };

    if mouse.just_pressed(MouseButton::Left) {
        round.touch_begin(point);
    } else if mouse.pressed(MouseButton::Left) {
        round.touch_move(point);
    }
}

fn handle_touch_gesture(
    touches: Res<Touches>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut round: ResMut<GameRound>,
) {
    if round.is_ended() {
        return;
    }

    if touches.iter_just_released().next().is_some()
        || touches.iter_just_canceled().next().is_some()
    {
        round.touch_end();
        return;
    }

    // Single-pointer tracking: the first active touch wins, extra
    // fingers are ignored.
    let Some(touch) = touches.iter().next() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(point) = camera.viewport_to_world_2d(camera_transform, touch.position()) else {
        return;
    };

    if touches.just_pressed(touch.id()) {
        round.touch_begin(point);
    } else {
        round.touch_move(point);
    }
}
