use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::constants;

/// User configuration from `settings.toml` in the platform config dir.
///
/// Preferences the settings screen manages are not stored here; they live in
/// the key-value store so each one is an independent record.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Overrides the default key-value store location.
  pub storage_path: Option<PathBuf>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", &constants().app_name)
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join(&constants().config_file);
      return Self::load_from(&config_file);
    }
    Self::default()
  }

  pub fn load_from(path: &Path) -> Self {
    match std::fs::read_to_string(path) {
      Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), err = %e, "config: unreadable, using defaults");
        Self::default()
      }),
      Err(_) => Self::default(),
    }
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join(&constants().config_file);
        if let Ok(content) = toml::to_string(self)
          && let Err(e) = std::fs::write(&config_file, content)
        {
          warn!(path = %config_file.display(), err = %e, "config: save failed");
        }
      }
    }
  }

  /// Where the key-value store lives unless overridden on the command line.
  pub fn storage_path(&self) -> Option<PathBuf> {
    self
      .storage_path
      .clone()
      .or_else(|| project_dirs().map(|d| d.data_dir().join(&constants().storage_file)))
  }
}

/// Directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_local_dir().join("logs"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_from_missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from(&dir.path().join("nope.toml")), Config::default());
  }

  #[test]
  fn load_from_parses_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "theme_name = \"light\"\nstorage_path = \"/tmp/prefs.json\"\n").unwrap();
    let config = Config::load_from(&path);
    assert_eq!(config.theme_name.as_deref(), Some("light"));
    assert_eq!(config.storage_path(), Some(PathBuf::from("/tmp/prefs.json")));
  }

  #[test]
  fn load_from_malformed_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "theme_name = [").unwrap();
    assert_eq!(Config::load_from(&path), Config::default());
  }
}
