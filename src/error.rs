use thiserror::Error;

/// Failures of the settings subsystem.
///
/// None of these are fatal: the in-memory store stays usable whatever
/// happens to persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
  #[error("invalid value '{value}' for preference '{key}'")]
  InvalidPreferenceValue { key: &'static str, value: String },

  #[error("failed to read '{key}' from storage: {reason}")]
  StorageRead { key: String, reason: String },

  #[error("failed to write '{key}' to storage: {reason}")]
  StorageWrite { key: String, reason: String },

  #[error("persistence task did not complete: {0}")]
  TaskFailed(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
