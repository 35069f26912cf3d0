use ratatui::style::Color;

/// Colour palette for the whole UI.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  /// Tint for the selected segment, titles and focus.
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 2] = [
  Theme {
    name: "dark",
    bg: Color::Rgb(0x15, 0x17, 0x18),
    fg: Color::Rgb(0xEC, 0xED, 0xEE),
    accent: Color::Rgb(0xFF, 0xFF, 0xFF),
    muted: Color::Rgb(0x9B, 0xA1, 0xA6),
    border: Color::Rgb(0x3A, 0x3F, 0x42),
    status: Color::Rgb(0x7F, 0xC8, 0xF8),
    error: Color::Rgb(0xF2, 0x6D, 0x6D),
    key_fg: Color::Rgb(0x15, 0x17, 0x18),
    key_bg: Color::Rgb(0x9B, 0xA1, 0xA6),
  },
  Theme {
    name: "light",
    bg: Color::Rgb(0xFF, 0xFF, 0xFF),
    fg: Color::Rgb(0x11, 0x18, 0x1C),
    accent: Color::Rgb(0x0A, 0x7E, 0xA4),
    muted: Color::Rgb(0x68, 0x70, 0x76),
    border: Color::Rgb(0xD0, 0xD5, 0xD8),
    status: Color::Rgb(0x0A, 0x7E, 0xA4),
    error: Color::Rgb(0xC0, 0x39, 0x2B),
    key_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
    key_bg: Color::Rgb(0x68, 0x70, 0x76),
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}
