//! One-shot startup reconciliation between persistent storage and the live
//! [`SettingsStore`].

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::error::SettingsError;
use crate::preference::{FontScale, PreferenceKey};
use crate::settings::{SettingsState, SettingsStore};
use crate::storage::{KeyValueStore, PendingWrite, spawn_write};

/// How a single preference was resolved during hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
  /// A valid stored value was adopted.
  Stored,
  /// Nothing stored yet; the default was adopted and written back.
  Defaulted,
  /// The stored value is not a member of the enumerated set. The default
  /// was adopted and storage left as is.
  Corrupted { raw: String },
  /// Storage could not be read. The default was adopted; no write-back, so
  /// a transiently unreadable record is not clobbered.
  ReadFailed,
}

/// What [`hydrate`] did, plus the write-backs it left running.
pub struct HydrationReport {
  pub outcomes: Vec<(PreferenceKey, KeyOutcome)>,
  pub pending_writes: Vec<PendingWrite>,
}

impl HydrationReport {
  /// True when every key came from storage or was freshly defaulted.
  pub fn is_clean(&self) -> bool {
    self.outcomes.iter().all(|(_, o)| matches!(o, KeyOutcome::Stored | KeyOutcome::Defaulted))
  }

  /// Wait for every write-back and return the ones that failed.
  pub async fn settle(self) -> Vec<SettingsError> {
    let results = join_all(self.pending_writes.into_iter().map(PendingWrite::wait)).await;
    results.into_iter().filter_map(Result::err).collect()
  }
}

/// Resolved value for one key, before it is applied to the store.
enum Resolved {
  FontScale(FontScale),
}

/// Load every known preference into `store`, filling in and persisting
/// defaults for keys that were never written, then mark the store hydrated.
///
/// Never fails: per-key storage problems are logged and degrade to the
/// compiled-in default, and `is_hydrated` is always `true` afterwards.
///
/// Defaults are captured from the store once, up front. A user change that
/// lands while the reads are in flight is overwritten when the resolved
/// values are applied, so preference-changing UI should wait for
/// `is_hydrated`.
pub async fn hydrate(store: &SettingsStore, storage: Arc<dyn KeyValueStore>) -> HydrationReport {
  let defaults = store.get_state();

  let reads = join_all(PreferenceKey::ALL.iter().map(|key| storage.get(key.as_str()))).await;

  let mut outcomes = Vec::with_capacity(PreferenceKey::ALL.len());
  let mut pending_writes = Vec::new();
  let mut resolved = Vec::with_capacity(PreferenceKey::ALL.len());

  for (key, read) in PreferenceKey::ALL.into_iter().zip(reads) {
    let (value, outcome) = resolve_key(key, read, &defaults);
    match outcome {
      KeyOutcome::Stored => info!(key = %key, "hydrate: adopted stored value"),
      KeyOutcome::Defaulted => {
        let literal = default_literal(key, &defaults);
        info!(key = %key, value = literal, "hydrate: key missing, persisting default");
        pending_writes.push(spawn_write(&storage, key.as_str(), literal));
      }
      KeyOutcome::Corrupted { ref raw } => {
        warn!(key = %key, raw = %raw, "hydrate: stored value not recognised, using default")
      }
      KeyOutcome::ReadFailed => {}
    }
    resolved.push(value);
    outcomes.push((key, outcome));
  }

  for value in resolved {
    match value {
      Resolved::FontScale(scale) => store.set_font_scale(scale),
    }
  }

  store.set_hydrated(true);
  let degraded = outcomes.iter().filter(|(_, o)| !matches!(o, KeyOutcome::Stored | KeyOutcome::Defaulted)).count();
  info!(keys = outcomes.len(), degraded, "hydrate: complete");

  HydrationReport { outcomes, pending_writes }
}

fn default_literal(key: PreferenceKey, defaults: &SettingsState) -> &'static str {
  match key {
    PreferenceKey::FontScale => defaults.font_scale.as_str(),
  }
}

fn resolve_key(
  key: PreferenceKey,
  read: Result<Option<String>, SettingsError>,
  defaults: &SettingsState,
) -> (Resolved, KeyOutcome) {
  match key {
    PreferenceKey::FontScale => {
      let fallback = defaults.font_scale;
      match read {
        Ok(None) => (Resolved::FontScale(fallback), KeyOutcome::Defaulted),
        Ok(Some(raw)) => match raw.parse::<FontScale>() {
          Ok(scale) => (Resolved::FontScale(scale), KeyOutcome::Stored),
          Err(_) => (Resolved::FontScale(fallback), KeyOutcome::Corrupted { raw }),
        },
        Err(e) => {
          error!(key = %key, err = %e, "hydrate: read failed, using default");
          (Resolved::FontScale(fallback), KeyOutcome::ReadFailed)
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::{BoxFuture, MemoryStore};
  use std::sync::Mutex as StdMutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Wraps a [`MemoryStore`], counting calls and failing on request.
  #[derive(Default)]
  struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_writes: bool,
    writes: AtomicUsize,
  }

  impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> BoxFuture<'static, Result<Option<String>, SettingsError>> {
      if self.fail_reads {
        let key = key.to_string();
        return Box::pin(async move { Err(SettingsError::StorageRead { key, reason: "disk on fire".into() }) });
      }
      self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'static, Result<(), SettingsError>> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      if self.fail_writes {
        let key = key.to_string();
        return Box::pin(async move { Err(SettingsError::StorageWrite { key, reason: "read-only".into() }) });
      }
      self.inner.set(key, value)
    }
  }

  #[tokio::test]
  async fn first_run_persists_default() {
    let store = SettingsStore::new();
    let memory = MemoryStore::new();
    let report = hydrate(&store, Arc::new(memory.clone())).await;

    assert_eq!(report.outcomes, vec![(PreferenceKey::FontScale, KeyOutcome::Defaulted)]);
    assert!(report.is_clean());
    let state = store.get_state();
    assert_eq!(state.font_scale, FontScale::Default);
    assert!(state.is_hydrated);

    assert!(report.settle().await.is_empty());
    assert_eq!(memory.snapshot().get("fontScale").map(String::as_str), Some("default"));
  }

  #[tokio::test]
  async fn returning_run_adopts_stored_value_without_writing() {
    let store = SettingsStore::new();
    let storage = Arc::new(FlakyStore { inner: MemoryStore::with_records([("fontScale", "large")]), ..Default::default() });
    let report = hydrate(&store, storage.clone()).await;

    assert_eq!(report.outcomes, vec![(PreferenceKey::FontScale, KeyOutcome::Stored)]);
    assert!(report.pending_writes.is_empty());
    assert_eq!(store.get_state().font_scale, FontScale::Large);
    assert!(store.get_state().is_hydrated);
    assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn corrupted_value_falls_back_to_default() {
    let store = SettingsStore::new();
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = store.subscribe(|s| s.font_scale, move |scale| sink.lock().unwrap().push(*scale));

    let memory = MemoryStore::with_records([("fontScale", "xlarge-typo")]);
    let report = hydrate(&store, Arc::new(memory.clone())).await;

    assert_eq!(
      report.outcomes,
      vec![(PreferenceKey::FontScale, KeyOutcome::Corrupted { raw: "xlarge-typo".to_string() })]
    );
    assert!(!report.is_clean());
    assert_eq!(store.get_state().font_scale, FontScale::Default);
    assert!(store.get_state().is_hydrated);
    // Default applied over default: no consumer ever saw anything else.
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(memory.snapshot().get("fontScale").map(String::as_str), Some("xlarge-typo"));
  }

  #[tokio::test]
  async fn storage_outage_still_hydrates_with_defaults() {
    let store = SettingsStore::new();
    let storage = Arc::new(FlakyStore { fail_reads: true, fail_writes: true, ..Default::default() });
    let report = hydrate(&store, storage.clone()).await;

    assert_eq!(report.outcomes, vec![(PreferenceKey::FontScale, KeyOutcome::ReadFailed)]);
    let state = store.get_state();
    assert!(state.is_hydrated);
    assert_eq!(state.font_scale, FontScale::Default);
    assert!(report.settle().await.is_empty());
    assert_eq!(storage.writes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn failed_write_back_is_reported_not_fatal() {
    let store = SettingsStore::new();
    let storage = Arc::new(FlakyStore { fail_writes: true, ..Default::default() });
    let report = hydrate(&store, storage.clone()).await;

    assert!(store.get_state().is_hydrated);
    assert_eq!(store.get_state().font_scale, FontScale::Default);
    let failures = report.settle().await;
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], SettingsError::StorageWrite { ref key, .. } if key == "fontScale"));
    assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn hydration_uses_defaults_captured_up_front() {
    // A pre-hydration value in the store is what "default" means for a
    // first run.
    let store = SettingsStore::new();
    store.set_font_scale(FontScale::Small);
    let memory = MemoryStore::new();
    let report = hydrate(&store, Arc::new(memory.clone())).await;

    assert!(report.settle().await.is_empty());
    assert_eq!(store.get_state().font_scale, FontScale::Small);
    assert_eq!(memory.snapshot().get("fontScale").map(String::as_str), Some("small"));
  }

  #[tokio::test]
  async fn hydration_notifies_subscribers_of_stored_value() {
    let store = SettingsStore::new();
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = store.subscribe(|s| (s.font_scale, s.is_hydrated), move |v| sink.lock().unwrap().push(*v));

    hydrate(&store, Arc::new(MemoryStore::with_records([("fontScale", "extra-large")]))).await;

    assert_eq!(*seen.lock().unwrap(), vec![(FontScale::ExtraLarge, false), (FontScale::ExtraLarge, true)]);
  }
}
