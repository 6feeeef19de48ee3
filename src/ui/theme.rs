use ratatui::style::Color;

use crate::model::StatusTone;
use crate::toast::ToastKind;

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);
pub const BAR_HIGHLIGHT_BG: Color = Color::Rgb(73, 102, 177);
pub const BAR_HIGHLIGHT_TEXT: Color = Color::Rgb(255, 255, 255);

pub const MENU_BG: Color = Color::Rgb(79, 79, 79);
pub const MENU_BORDER: Color = Color::Rgb(208, 208, 208);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);
pub const PANEL_HIGHLIGHT_BG: Color = Color::Rgb(120, 160, 255);

pub const STATUS_CONNECTED: Color = Color::Rgb(34, 197, 94);
pub const STATUS_FAILED: Color = Color::Rgb(239, 68, 68);
pub const ACCENT: Color = Color::Rgb(168, 85, 247);

pub fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Connected => STATUS_CONNECTED,
        StatusTone::Failed => STATUS_FAILED,
        StatusTone::Neutral => FG_DIM,
    }
}

pub fn toast_color(kind: ToastKind) -> Color {
    match kind {
        ToastKind::Success => STATUS_CONNECTED,
        ToastKind::Error => STATUS_FAILED,
    }
}
