//! Asynchronous string-keyed persistence for preferences.
//!
//! Each preference is its own record. Values are the literal preference
//! strings; nothing derived from them is ever stored.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{SettingsError, SettingsResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait KeyValueStore: Send + Sync + 'static {
  /// `Ok(None)` means the key was never written.
  fn get(&self, key: &str) -> BoxFuture<'static, SettingsResult<Option<String>>>;

  fn set(&self, key: &str, value: &str) -> BoxFuture<'static, SettingsResult<()>>;
}

/// A persistence write running in the background. Await it to learn the
/// outcome, or drop it to let the write finish unobserved.
pub struct PendingWrite {
  pub key: String,
  handle: JoinHandle<SettingsResult<()>>,
}

impl PendingWrite {
  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  pub async fn wait(self) -> SettingsResult<()> {
    match self.handle.await {
      Ok(result) => result,
      Err(e) => Err(SettingsError::TaskFailed(e.to_string())),
    }
  }
}

/// Issue `storage.set(key, value)` on the runtime and return immediately.
///
/// Last write wins by issue order only if the backend enforces it;
/// [`JsonFileStore`] and [`MemoryStore`] both do.
pub fn spawn_write(storage: &Arc<dyn KeyValueStore>, key: &str, value: &str) -> PendingWrite {
  // Create the future before spawning so the backend observes the write in
  // issue order.
  let fut = storage.set(key, value);
  let log_key = key.to_string();
  let handle = tokio::spawn(async move {
    let result = fut.await;
    if let Err(ref e) = result {
      warn!(key = %log_key, err = %e, "storage: write failed");
    }
    result
  });
  PendingWrite { key: key.to_string(), handle }
}

// --- JSON file backend ---

/// All records in one JSON object file, rewritten atomically on every set.
///
/// A file that exists but does not parse is never overwritten: reads and
/// writes both fail until it is repaired or removed, which leaves the
/// session running on in-memory values only.
pub struct JsonFileStore {
  path: PathBuf,
  next_ticket: AtomicU64,
  /// Ticket of the newest write that reached disk, per key.
  written: Arc<tokio::sync::Mutex<BTreeMap<String, u64>>>,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), next_ticket: AtomicU64::new(0), written: Arc::default() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

async fn read_records(path: &Path) -> Result<BTreeMap<String, String>, String> {
  match tokio::fs::read_to_string(path).await {
    Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
    Ok(contents) => serde_json::from_str(&contents).map_err(|e| format!("malformed {}: {}", path.display(), e)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
    Err(e) => Err(e.to_string()),
  }
}

async fn write_records(path: &Path, records: &BTreeMap<String, String>) -> Result<(), String> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
  }
  let json = serde_json::to_string_pretty(records).map_err(|e| e.to_string())?;
  let temp_path = path.with_extension("json.tmp");
  tokio::fs::write(&temp_path, json).await.map_err(|e| e.to_string())?;
  tokio::fs::rename(&temp_path, path).await.map_err(|e| e.to_string())
}

impl KeyValueStore for JsonFileStore {
  fn get(&self, key: &str) -> BoxFuture<'static, SettingsResult<Option<String>>> {
    let path = self.path.clone();
    let key = key.to_string();
    Box::pin(async move {
      let mut records =
        read_records(&path).await.map_err(|reason| SettingsError::StorageRead { key: key.clone(), reason })?;
      Ok(records.remove(&key))
    })
  }

  fn set(&self, key: &str, value: &str) -> BoxFuture<'static, SettingsResult<()>> {
    let path = self.path.clone();
    let key = key.to_string();
    let value = value.to_string();
    // Ticket taken at issue time, not when the future first runs.
    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
    let written = Arc::clone(&self.written);
    Box::pin(async move {
      let mut written = written.lock().await;
      if written.get(&key).is_some_and(|newest| *newest > ticket) {
        debug!(key = %key, ticket, "storage: superseded write skipped");
        return Ok(());
      }
      let fail = |reason| SettingsError::StorageWrite { key: key.clone(), reason };
      let mut records = read_records(&path).await.map_err(fail)?;
      records.insert(key.clone(), value);
      write_records(&path, &records).await.map_err(fail)?;
      written.insert(key.clone(), ticket);
      debug!(key = %key, path = %path.display(), "storage: wrote record");
      Ok(())
    })
  }
}

// --- In-memory backend ---

/// Process-local map. Nothing survives a restart.
#[derive(Default, Clone)]
pub struct MemoryStore {
  records: Arc<StdMutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[cfg(test)]
impl MemoryStore {
  pub fn with_records<'a>(records: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    let map = records.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Self { records: Arc::new(StdMutex::new(map)) }
  }

  pub fn snapshot(&self) -> BTreeMap<String, String> {
    self.records.lock().map(|r| r.clone()).unwrap_or_default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> BoxFuture<'static, SettingsResult<Option<String>>> {
    let result = self
      .records
      .lock()
      .map(|r| r.get(key).cloned())
      .map_err(|e| SettingsError::StorageRead { key: key.to_string(), reason: e.to_string() });
    Box::pin(async move { result })
  }

  fn set(&self, key: &str, value: &str) -> BoxFuture<'static, SettingsResult<()>> {
    // Applied eagerly so writes land in issue order.
    let result = self
      .records
      .lock()
      .map(|mut r| {
        r.insert(key.to_string(), value.to_string());
      })
      .map_err(|e| SettingsError::StorageWrite { key: key.to_string(), reason: e.to_string() });
    Box::pin(async move { result })
  }
}
