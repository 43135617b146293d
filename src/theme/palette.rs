use bevy::prelude::*;

/// The resting background, matching the danger ramp's teal at rest.
pub const BACKDROP: Color = Color::srgb(0.498, 0.784, 0.804);

/// Black text for light backgrounds
pub const LABEL_TEXT: Color = Color::srgb(0.1, 0.1, 0.1);

/// Black text for headers
pub const HEADER_TEXT: Color = Color::srgb(0.1, 0.1, 0.1);

/// Black text for buttons
pub const BUTTON_TEXT: Color = Color::srgb(0.1, 0.1, 0.1);
/// #4666bf
pub const BUTTON_BACKGROUND: Color = Color::srgb(0.275, 0.400, 0.750);
/// #6299d1
pub const BUTTON_HOVERED_BACKGROUND: Color = Color::srgb(0.384, 0.600, 0.820);
/// #3d4999
pub const BUTTON_PRESSED_BACKGROUND: Color = Color::srgb(0.239, 0.286, 0.600);

/// Score label above the persisted high score.
pub const SCORE_RECORD: Color = Color::srgb(0.95, 0.85, 0.2);
/// Score label while the total is negative.
pub const SCORE_PENALTY: Color = Color::srgb(0.9, 0.25, 0.25);
/// Score label otherwise.
pub const SCORE_NEUTRAL: Color = Color::WHITE;
