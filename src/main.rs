mod app;
mod config;
mod constants;
mod error;
mod initializer;
mod input;
mod preference;
mod scale;
mod settings;
mod storage;
mod theme;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use constants::constants;
use settings::SettingsStore;
use storage::{JsonFileStore, KeyValueStore, MemoryStore};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Key-value store file (default: platform data dir)
  #[arg(short, long, conflicts_with = "ephemeral")]
  storage: Option<PathBuf>,

  /// Keep preferences in memory only; nothing is read from or written to disk
  #[arg(long)]
  ephemeral: bool,

  /// Font scale to apply once settings have loaded: small, default, large or extra-large
  #[arg(long)]
  font_scale: Option<String>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file; the terminal belongs to the UI. `RUST_LOG`
/// overrides the default `info` level.
fn init_logging() -> Option<WorkerGuard> {
  let dir = config::log_dir()?;
  std::fs::create_dir_all(&dir).ok()?;
  let appender = tracing_appender::rolling::daily(dir, &constants().log_file_prefix);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init().ok()?;
  Some(guard)
}

fn open_storage(args: &Args, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
  if args.ephemeral {
    info!("storage: in-memory");
    return Ok(Arc::new(MemoryStore::new()));
  }
  let path = args
    .storage
    .clone()
    .or_else(|| config.storage_path())
    .context("Could not determine a storage location; pass --storage or --ephemeral")?;
  let store = JsonFileStore::new(path);
  info!(path = %store.path().display(), "storage: json file");
  Ok(Arc::new(store))
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging();
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  let config = Config::load();
  let storage = open_storage(&args, &config)?;
  let store = SettingsStore::new();
  let mut app = App::new(store, storage, config).with_startup_font_scale(args.font_scale);
  app.start_hydration();

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.flush_writes().await;
  info!("exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending().await?;
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
