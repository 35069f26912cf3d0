use std::fmt;
use std::str::FromStr;

use crate::error::SettingsError;

/// Every preference the app knows about. Each one is an independent record
/// in the key-value store, keyed by [`PreferenceKey::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
  FontScale,
}

impl PreferenceKey {
  pub const ALL: [PreferenceKey; 1] = [PreferenceKey::FontScale];

  /// Stable storage literal. Changing it orphans existing user data.
  pub fn as_str(self) -> &'static str {
    match self {
      PreferenceKey::FontScale => "fontScale",
    }
  }
}

impl fmt::Display for PreferenceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Global text size preference.
///
/// The set is closed: adding a variant requires a matching entry in
/// [`crate::scale::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontScale {
  Small,
  #[default]
  Default,
  Large,
  ExtraLarge,
}

impl FontScale {
  /// In display order, smallest first.
  pub const ALL: [FontScale; 4] = [FontScale::Small, FontScale::Default, FontScale::Large, FontScale::ExtraLarge];

  pub fn as_str(self) -> &'static str {
    match self {
      FontScale::Small => "small",
      FontScale::Default => "default",
      FontScale::Large => "large",
      FontScale::ExtraLarge => "extra-large",
    }
  }

  /// Human label for the segmented control.
  pub fn label(self) -> &'static str {
    match self {
      FontScale::Small => "Small",
      FontScale::Default => "Default",
      FontScale::Large => "Large",
      FontScale::ExtraLarge => "Extra large",
    }
  }

  pub fn index(self) -> usize {
    // Safety: ALL contains every variant, so position() always finds it.
    FontScale::ALL.iter().position(|s| *s == self).unwrap_or(1)
  }

  /// Neighbouring value, clamped at both ends.
  pub fn step(self, delta: isize) -> FontScale {
    let last = FontScale::ALL.len() as isize - 1;
    let idx = (self.index() as isize + delta).clamp(0, last);
    FontScale::ALL[idx as usize]
  }
}

impl fmt::Display for FontScale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FontScale {
  type Err = SettingsError;

  /// Exact match on the storage literal. Case and whitespace are not forgiven,
  /// since persisted values are only ever written by [`FontScale::as_str`].
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    FontScale::ALL.into_iter().find(|scale| scale.as_str() == s).ok_or_else(|| {
      SettingsError::InvalidPreferenceValue { key: PreferenceKey::FontScale.as_str(), value: s.to_string() }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_every_storage_literal() {
    for scale in FontScale::ALL {
      assert_eq!(scale.as_str().parse::<FontScale>(), Ok(scale));
    }
  }

  #[test]
  fn rejects_unknown_literals() {
    for raw in ["xlarge-typo", "", "Large", " small", "extra_large"] {
      let err = raw.parse::<FontScale>().unwrap_err();
      assert_eq!(err, SettingsError::InvalidPreferenceValue { key: "fontScale", value: raw.to_string() });
    }
  }

  #[test]
  fn default_is_default() {
    assert_eq!(FontScale::default(), FontScale::Default);
  }

  #[test]
  fn step_clamps_at_ends() {
    assert_eq!(FontScale::Small.step(-1), FontScale::Small);
    assert_eq!(FontScale::Small.step(1), FontScale::Default);
    assert_eq!(FontScale::Large.step(1), FontScale::ExtraLarge);
    assert_eq!(FontScale::ExtraLarge.step(1), FontScale::ExtraLarge);
    assert_eq!(FontScale::ExtraLarge.step(-3), FontScale::Small);
  }

  #[test]
  fn key_literal_is_stable() {
    assert_eq!(PreferenceKey::FontScale.as_str(), "fontScale");
    assert_eq!(PreferenceKey::ALL.len(), 1);
  }
}
