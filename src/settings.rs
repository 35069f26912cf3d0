use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tracing::debug;

use crate::error::SettingsResult;
use crate::preference::FontScale;

/// Every preference value plus the hydration flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsState {
  pub font_scale: FontScale,
  /// Set once startup hydration has finished, successfully or not.
  pub is_hydrated: bool,
}

type Listener = Box<dyn FnMut(&SettingsState) + Send>;

#[derive(Default)]
struct Inner {
  state: StdMutex<SettingsState>,
  listeners: StdMutex<Vec<(u64, Listener)>>,
  next_id: AtomicU64,
}

/// Single source of truth for the live settings.
///
/// Cloning gives another handle to the same state. The store never touches
/// persistent storage, so every operation here is synchronous and cannot
/// fail on I/O.
#[derive(Clone, Default)]
pub struct SettingsStore {
  inner: Arc<Inner>,
}

/// Handle returned by [`SettingsStore::subscribe`]. Dropping it does not
/// unsubscribe.
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct Subscription {
  id: u64,
  inner: std::sync::Weak<Inner>,
}

impl Subscription {
  pub fn unsubscribe(self) {
    if let Some(inner) = self.inner.upgrade() {
      lock(&inner.listeners).retain(|(id, _)| *id != self.id);
      debug!(id = self.id, "settings: unsubscribed");
    }
  }
}

/// Poisoning only means a listener panicked mid-notification; the state
/// itself is always written whole, so keep going with it.
fn lock<T>(m: &StdMutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SettingsStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get_state(&self) -> SettingsState {
    lock(&self.inner.state).clone()
  }

  /// Register `callback` for changes to the slice picked by `selector`.
  ///
  /// The callback runs synchronously inside the mutating call, and only
  /// when the selected value differs from the one last seen. It may read
  /// the store, but must not mutate it, subscribe or unsubscribe from
  /// inside the callback.
  pub fn subscribe<T, S, F>(&self, selector: S, mut callback: F) -> Subscription
  where
    T: PartialEq + Send + 'static,
    S: Fn(&SettingsState) -> T + Send + 'static,
    F: FnMut(&T) + Send + 'static,
  {
    let mut last = selector(&self.get_state());
    let listener: Listener = Box::new(move |state| {
      let next = selector(state);
      if next != last {
        callback(&next);
        last = next;
      }
    });

    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    lock(&self.inner.listeners).push((id, listener));
    debug!(id, "settings: subscribed");
    Subscription { id, inner: Arc::downgrade(&self.inner) }
  }

  /// Validate and apply a font scale given as its storage literal.
  ///
  /// An unknown value leaves the state untouched and is returned as
  /// [`crate::error::SettingsError::InvalidPreferenceValue`].
  pub fn update_font_scale(&self, value: &str) -> SettingsResult<FontScale> {
    let scale = value.parse::<FontScale>()?;
    self.set_font_scale(scale);
    Ok(scale)
  }

  /// Apply an already-valid font scale. Subscribers are notified before
  /// this returns.
  pub fn set_font_scale(&self, scale: FontScale) {
    self.mutate(|s| s.font_scale = scale);
  }

  pub fn set_hydrated(&self, flag: bool) {
    self.mutate(|s| s.is_hydrated = flag);
  }

  /// Listeners stay locked from the write through the last callback, so
  /// concurrent mutations reach every listener in the order they hit the
  /// state. A callback may call `get_state()` but must not mutate the store
  /// or subscribe; either would deadlock on the listener lock.
  fn mutate(&self, f: impl FnOnce(&mut SettingsState)) {
    let mut listeners = lock(&self.inner.listeners);
    let snapshot = {
      let mut state = lock(&self.inner.state);
      f(&mut state);
      state.clone()
    };
    for (_, listener) in listeners.iter_mut() {
      listener(&snapshot);
    }
  }
}

impl std::fmt::Debug for SettingsStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SettingsStore")
      .field("state", &self.get_state())
      .field("listeners", &lock(&self.inner.listeners).len())
      .finish()
  }
}
