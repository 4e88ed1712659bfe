use ratatui::style::Color;

// Phosphor-green terminal palette with one magenta accent.
//
// Keep this palette cohesive. Prefer adding new roles here instead of sprinkling colors through the UI.
pub const BG: Color = Color::Rgb(4, 8, 4);
pub const BAR_BG: Color = Color::Rgb(10, 24, 12);

pub const FG: Color = Color::Rgb(170, 255, 170);
pub const MUTED: Color = Color::Rgb(96, 160, 104);
pub const DIM: Color = Color::Rgb(58, 96, 62);
pub const BORDER: Color = Color::Rgb(40, 90, 48);

pub const ACCENT: Color = Color::Rgb(255, 51, 102);
pub const ACCENT_BG: Color = Color::Rgb(48, 12, 24);

// Result kinds.
pub const SUCCESS: Color = Color::Rgb(134, 239, 172);
pub const ERROR: Color = Color::Rgb(255, 102, 102);
pub const INFO: Color = FG;
