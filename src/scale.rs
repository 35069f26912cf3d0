//! Maps the font scale preference to a numeric multiplier, and the text
//! styles that consume it.
//!
//! Factors are never persisted; they are recomputed from the stored literal
//! every time, so the table can change without a migration.

use crate::constants::constants;
use crate::preference::FontScale;

/// Multiplier for a given preference value.
///
/// Strictly increasing in [`FontScale::ALL`] order, and exactly `1.0` for
/// [`FontScale::Default`].
pub fn resolve(value: FontScale) -> f32 {
  match value {
    FontScale::Small => 0.8,
    FontScale::Default => 1.0,
    FontScale::Large => 1.25,
    FontScale::ExtraLarge => 1.5,
  }
}

/// Multiplier for an untyped value, e.g. one read back from storage.
/// Anything outside the enumerated set resolves to `1.0`.
#[allow(dead_code)]
pub fn resolve_raw(value: &str) -> f32 {
  value.parse::<FontScale>().map_or(1.0, resolve)
}

/// Where a consumer's scale factor comes from.
///
/// An explicit override always wins over the ambient store value; `Unset`
/// means neither has been supplied yet and renders at `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScaleSource {
  #[default]
  Unset,
  Override(f32),
  Ambient(FontScale),
}

impl ScaleSource {
  pub fn factor(self) -> f32 {
    match self {
      ScaleSource::Unset => 1.0,
      ScaleSource::Override(f) if f.is_finite() && f > 0.0 => f,
      ScaleSource::Override(_) => 1.0,
      ScaleSource::Ambient(scale) => resolve(scale),
    }
  }

  /// Feed a new ambient value. Overrides are left untouched.
  pub fn with_ambient(self, scale: FontScale) -> ScaleSource {
    match self {
      ScaleSource::Override(_) => self,
      ScaleSource::Unset | ScaleSource::Ambient(_) => ScaleSource::Ambient(scale),
    }
  }
}

/// Text roles, each with a base size taken from `constants.ron`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
  Default,
  DefaultSemiBold,
  Title,
  Subtitle,
  Link,
  Small,
  Large,
}

/// Resolved presentation values. `line_height` is `None` for roles that
/// leave it to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledStyle {
  pub font_size: f32,
  pub line_height: Option<f32>,
}

impl ScaledStyle {
  /// Terminal rows one line of this style occupies. Falls back to the font
  /// size when no line height is defined.
  pub fn rows(&self, row_unit: f32) -> u16 {
    let height = self.line_height.unwrap_or(self.font_size);
    (height / row_unit).round().max(1.0) as u16
  }
}

impl TextKind {
  pub fn base_style(self) -> ScaledStyle {
    let c = constants();
    let (font_size, line_height) = match self {
      TextKind::Small => (c.font_size_small, Some(c.line_height_small)),
      TextKind::Default | TextKind::DefaultSemiBold => (c.font_size_default, Some(c.line_height_default)),
      TextKind::Title => (c.font_size_title, Some(c.line_height_title)),
      TextKind::Subtitle => (c.font_size_subtitle, None),
      TextKind::Link => (c.font_size_default, Some(c.line_height_link)),
      TextKind::Large => (c.font_size_large, Some(c.line_height_default)),
    };
    ScaledStyle { font_size, line_height }
  }

  pub fn is_bold(self) -> bool {
    matches!(self, TextKind::Title | TextKind::Subtitle | TextKind::DefaultSemiBold)
  }
}

/// A piece of text that derives its size from a [`ScaleSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledText {
  pub kind: TextKind,
  pub source: ScaleSource,
}

impl ScaledText {
  pub fn new(kind: TextKind) -> Self {
    Self { kind, source: ScaleSource::Unset }
  }

  pub fn with_override(mut self, factor: f32) -> Self {
    self.source = ScaleSource::Override(factor);
    self
  }

  pub fn style(&self) -> ScaledStyle {
    let base = self.kind.base_style();
    let factor = self.source.factor();
    ScaledStyle { font_size: base.font_size * factor, line_height: base.line_height.map(|h| h * factor) }
  }
}

#[cfg(test)]
impl ScaledText {
  pub fn ambient(mut self, scale: FontScale) -> Self {
    self.source = self.source.with_ambient(scale);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_resolves_to_exactly_one() {
    assert_eq!(resolve(FontScale::Default), 1.0);
    assert_eq!(resolve_raw("default"), 1.0);
  }

  #[test]
  fn resolve_is_stable_across_calls() {
    for scale in FontScale::ALL {
      assert_eq!(resolve(scale), resolve(scale));
      assert_eq!(resolve_raw(scale.as_str()), resolve(scale));
    }
  }

  #[test]
  fn factors_increase_with_enum_order() {
    let factors: Vec<f32> = FontScale::ALL.iter().map(|s| resolve(*s)).collect();
    assert!(factors.windows(2).all(|w| w[0] < w[1]), "{factors:?}");
    assert!(factors.iter().all(|f| *f > 0.0));
  }

  #[test]
  fn unknown_values_fall_back_to_one() {
    for raw in ["xlarge-typo", "", "LARGE", "1.5"] {
      assert_eq!(resolve_raw(raw), 1.0);
    }
  }

  #[test]
  fn override_beats_ambient() {
    let source = ScaleSource::Override(2.0).with_ambient(FontScale::Small);
    assert_eq!(source, ScaleSource::Override(2.0));
    assert_eq!(source.factor(), 2.0);
  }

  #[test]
  fn unset_takes_ambient() {
    assert_eq!(ScaleSource::Unset.factor(), 1.0);
    let source = ScaleSource::Unset.with_ambient(FontScale::Large);
    assert_eq!(source.factor(), 1.25);
    assert_eq!(source.with_ambient(FontScale::Small).factor(), 0.8);
  }

  #[test]
  fn explicit_override_of_one_is_not_replaced() {
    // An override equal to the default factor is still an override.
    let source = ScaleSource::Override(1.0).with_ambient(FontScale::ExtraLarge);
    assert_eq!(source.factor(), 1.0);
  }

  #[test]
  fn bad_overrides_fall_back_to_one() {
    assert_eq!(ScaleSource::Override(0.0).factor(), 1.0);
    assert_eq!(ScaleSource::Override(-1.0).factor(), 1.0);
    assert_eq!(ScaleSource::Override(f32::NAN).factor(), 1.0);
  }

  #[test]
  fn scaled_text_scales_defined_properties_only() {
    let title = ScaledText::new(TextKind::Title).ambient(FontScale::ExtraLarge).style();
    assert_eq!(title.font_size, 48.0);
    assert_eq!(title.line_height, Some(48.0));

    let subtitle = ScaledText::new(TextKind::Subtitle).ambient(FontScale::Large).style();
    assert_eq!(subtitle.font_size, 25.0);
    assert_eq!(subtitle.line_height, None);
  }

  #[test]
  fn scaled_text_override() {
    let style = ScaledText::new(TextKind::Default).with_override(0.5).ambient(FontScale::Large).style();
    assert_eq!(style.font_size, 8.0);
    assert_eq!(style.line_height, Some(12.0));
  }

  #[test]
  fn rows_never_below_one() {
    let tiny = ScaledStyle { font_size: 2.0, line_height: Some(2.0) };
    assert_eq!(tiny.rows(24.0), 1);
    let title = ScaledText::new(TextKind::Title).ambient(FontScale::ExtraLarge).style();
    assert_eq!(title.rows(24.0), 2);
    let subtitle = ScaledStyle { font_size: 50.0, line_height: None };
    assert_eq!(subtitle.rows(24.0), 2);
  }
}
