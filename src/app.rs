use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::initializer::{HydrationReport, KeyOutcome, hydrate};
use crate::preference::{FontScale, PreferenceKey};
use crate::scale::{ScaleSource, ScaledText, TextKind};
use crate::settings::{SettingsStore, Subscription};
use crate::storage::{KeyValueStore, PendingWrite, spawn_write};
use crate::theme::{THEMES, Theme, theme_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Home,
  Settings,
}

impl Screen {
  pub const ALL: [Screen; 2] = [Screen::Home, Screen::Settings];

  pub fn label(self) -> &'static str {
    match self {
      Screen::Home => "Home",
      Screen::Settings => "Settings",
    }
  }

  pub fn next(self) -> Screen {
    match self {
      Screen::Home => Screen::Settings,
      Screen::Settings => Screen::Home,
    }
  }
}

/// In-flight async work the run loop polls each frame.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) hydrate_rx: Option<oneshot::Receiver<HydrationReport>>,
  pub(crate) writes: Vec<PendingWrite>,
}

pub struct App {
  pub screen: Screen,
  pub theme_index: usize,
  pub store: SettingsStore,
  storage: Arc<dyn KeyValueStore>,
  config: Config,
  /// Text scale as seen by rendering code, fed from the store subscription.
  pub text_scale: ScaleSource,
  scale_rx: mpsc::UnboundedReceiver<FontScale>,
  scale_sub: Option<Subscription>,
  /// Font scale requested on the command line, applied once hydrated.
  startup_font_scale: Option<String>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(store: SettingsStore, storage: Arc<dyn KeyValueStore>, config: Config) -> Self {
    let (tx, scale_rx) = mpsc::unbounded_channel();
    let scale_sub = store.subscribe(
      |s| s.font_scale,
      move |scale| {
        let _ = tx.send(*scale);
      },
    );
    let text_scale = ScaleSource::Unset.with_ambient(store.get_state().font_scale);

    Self {
      screen: Screen::Home,
      theme_index: theme_index(config.theme_name.as_deref()),
      store,
      storage,
      config,
      text_scale,
      scale_rx,
      scale_sub: Some(scale_sub),
      startup_font_scale: None,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn with_startup_font_scale(mut self, value: Option<String>) -> Self {
    self.startup_font_scale = value;
    self
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is bounded by theme_index() and the modulo in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn is_hydrated(&self) -> bool {
    self.store.get_state().is_hydrated
  }

  pub fn font_scale(&self) -> FontScale {
    self.store.get_state().font_scale
  }

  /// Text of `kind` at the current ambient scale.
  pub fn text(&self, kind: TextKind) -> ScaledText {
    ScaledText { kind, source: self.text_scale }
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_display_secs)
    {
      self.clear_error();
    }
  }

  /// Kick off startup hydration on the runtime.
  pub fn start_hydration(&mut self) {
    let store = self.store.clone();
    let storage = Arc::clone(&self.storage);
    self.status_message = Some("Loading settings…".to_string());

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(hydrate(&store, storage).await);
    });
    self.tasks.hydrate_rx = Some(rx);
  }

  /// Take over a finished hydration and keep its write-backs polled.
  ///
  /// Degraded keys are already logged by `hydrate`; the user only ever sees
  /// the defaults that replaced them.
  pub fn on_hydrated(&mut self, report: HydrationReport) {
    self.status_message = None;
    if !report.is_clean() {
      let degraded =
        report.outcomes.iter().filter(|(_, o)| !matches!(o, KeyOutcome::Stored | KeyOutcome::Defaulted)).count();
      warn!(degraded, "hydrate: finished with degraded keys");
    }
    self.tasks.writes.extend(report.pending_writes);

    if let Some(raw) = self.startup_font_scale.take() {
      match self.store.update_font_scale(&raw) {
        Ok(scale) => self.persist_font_scale(scale),
        Err(e) => {
          warn!(err = %e, "startup: rejected font scale");
          self.set_error(e.to_string());
        }
      }
    }
  }

  /// User picked a font scale. Applies in memory first, then persists in
  /// the background. Ignored until hydration has finished.
  pub fn set_font_scale(&mut self, scale: FontScale) {
    if !self.is_hydrated() {
      self.info_message = Some("Settings are still loading".to_string());
      return;
    }
    if scale == self.font_scale() {
      return;
    }
    self.store.set_font_scale(scale);
    self.persist_font_scale(scale);
  }

  fn persist_font_scale(&mut self, scale: FontScale) {
    info!(value = %scale, "settings: font scale changed");
    let write = spawn_write(&self.storage, PreferenceKey::FontScale.as_str(), scale.as_str());
    self.tasks.writes.push(write);
  }

  pub fn step_font_scale(&mut self, delta: isize) {
    let next = self.font_scale().step(delta);
    self.set_font_scale(next);
  }

  pub async fn check_pending(&mut self) -> Result<()> {
    if let Some(mut rx) = self.tasks.hydrate_rx.take() {
      match rx.try_recv() {
        Ok(report) => self.on_hydrated(report),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.hydrate_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          // The task died before reporting; make sure the app is usable anyway.
          warn!("hydrate: task ended without a report");
          self.store.set_hydrated(true);
          self.status_message = None;
        }
      }
    }

    if !self.tasks.writes.is_empty() {
      let (done, pending): (Vec<_>, Vec<_>) =
        std::mem::take(&mut self.tasks.writes).into_iter().partition(PendingWrite::is_finished);
      self.tasks.writes = pending;
      for write in done {
        // Failures were logged when the write ended; nothing to show.
        let _ = write.wait().await;
      }
    }

    // Re-derive presentation from the latest ambient value.
    while let Ok(scale) = self.scale_rx.try_recv() {
      self.text_scale = self.text_scale.with_ambient(scale);
    }

    Ok(())
  }

  /// Wait for outstanding persistence writes, e.g. before exit.
  pub async fn flush_writes(&mut self) {
    for write in std::mem::take(&mut self.tasks.writes) {
      let key = write.key.clone();
      if let Err(e) = write.wait().await {
        warn!(key = %key, err = %e, "settings: write lost on exit");
      }
    }
  }
}

impl Drop for App {
  fn drop(&mut self) {
    if let Some(sub) = self.scale_sub.take() {
      sub.unsubscribe();
    }
  }
}
