//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub storage_file: String,
  pub config_file: String,
  pub log_file_prefix: String,

  // Typography
  pub font_size_small: f32,
  pub font_size_default: f32,
  pub font_size_large: f32,
  pub font_size_subtitle: f32,
  pub font_size_title: f32,
  pub line_height_small: f32,
  pub line_height_default: f32,
  pub line_height_title: f32,
  pub line_height_link: f32,
  pub row_unit: f32,

  pub error_display_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.app_name, "tp");
    assert!(c.row_unit > 0.0);
    assert!(c.font_size_small < c.font_size_default);
    assert!(c.font_size_default < c.font_size_title);
  }
}
