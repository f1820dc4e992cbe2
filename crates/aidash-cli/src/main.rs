//! `aidash`: terminal dashboard for AI-tool bookmarks and subscriptions.
//!
//! # Usage
//!
//! ```
//! aidash --url http://localhost:8080
//! aidash --config ~/.config/aidash/config.toml
//! aidash summary
//! aidash export --out backup.json
//! aidash import ai-dashboard-backup-2024-06-01.json
//! ```

mod app;
mod client;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use aidash_core::{
  backup::backup_file_name,
  dashboard::{format_amount, format_krw, format_usd},
};
use anyhow::{Context, Result};
use app::{App, rate_origin_label};
use chrono::Local;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "aidash", about = "Terminal dashboard for AI tools and subscriptions")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs, export_dir).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the aidash server (default: http://localhost:8080).
  #[arg(long, env = "AIDASH_URL")]
  url: Option<String>,

  /// HTTP timeout in seconds (default: 30).
  #[arg(long, env = "AIDASH_TIMEOUT_SECS")]
  timeout_secs: Option<u64>,

  /// Directory the `x` key writes backups to (default: current directory).
  #[arg(long, env = "AIDASH_EXPORT_DIR")]
  export_dir: Option<PathBuf>,

  /// Write logs to this file. Nothing is logged otherwise.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the subscription table and totals, then exit.
  Summary,
  /// Download a backup document.
  Export {
    /// Output path (default: ai-dashboard-backup-<today>.json).
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Replace all services and subscriptions with a backup document.
  Import {
    path: PathBuf,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
  #[serde(default)]
  export_dir:   Option<PathBuf>,
}

/// Settings after merging flags, config file and defaults.
#[derive(Debug, PartialEq)]
struct Settings {
  api:        ApiConfigParts,
  export_dir: PathBuf,
}

#[derive(Debug, PartialEq)]
struct ApiConfigParts {
  base_url: String,
  timeout:  Duration,
}

/// CLI flags override config file, which overrides defaults.
fn resolve(args: &Args, file_cfg: ConfigFile) -> Settings {
  let base_url = args
    .url
    .clone()
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:8080".to_string());
  let timeout_secs = args.timeout_secs.or(file_cfg.timeout_secs).unwrap_or(30);
  let export_dir = args
    .export_dir
    .clone()
    .or(file_cfg.export_dir)
    .unwrap_or_else(|| PathBuf::from("."));

  Settings {
    api: ApiConfigParts { base_url, timeout: Duration::from_secs(timeout_secs) },
    export_dir,
  }
}

fn read_config_file(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// Log to `path` if given. The terminal belongs to the TUI, so there is no
/// stderr fallback.
fn init_logging(path: Option<&Path>) -> Result<()> {
  let Some(path) = path else { return Ok(()) };
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_logging(args.log_file.as_deref())?;

  let file_cfg = read_config_file(args.config.as_deref())?;
  let settings = resolve(&args, file_cfg);
  tracing::info!(url = %settings.api.base_url, "starting aidash");

  let client = ApiClient::new(ApiConfig {
    base_url: settings.api.base_url,
    timeout:  settings.api.timeout,
  })?;

  match args.command {
    Some(Command::Summary) => print_summary(&client).await,
    Some(Command::Export { out }) => {
      let path = out.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
      let document = client.export().await?;
      std::fs::write(&path, document).with_context(|| format!("writing {}", path.display()))?;
      println!("Exported to {}", path.display());
      Ok(())
    }
    Some(Command::Import { path }) => {
      let document = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
      let report = client.import(document).await?;
      println!(
        "Imported {} services and {} subscriptions",
        report.services, report.subscriptions
      );
      for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.location, skipped.reason);
      }
      Ok(())
    }
    None => run_tui(client, settings.export_dir).await,
  }
}

async fn print_summary(client: &ApiClient) -> Result<()> {
  let snapshot = client.dashboard().await?;
  for row in &snapshot.rows {
    println!(
      "{:<24} {:>14}/{:<7} next {:<10}  {}",
      row.name,
      format_amount(row.price.in_currency(row.currency), row.currency),
      row.period.as_ref(),
      row
        .next_renewal
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into()),
      row.status_label,
    );
  }
  let t = snapshot.totals;
  println!();
  println!("Monthly: {} / {}", format_usd(t.monthly_usd), format_krw(t.monthly_krw));
  println!("Yearly:  {} / {}", format_usd(t.yearly_usd), format_krw(t.yearly_krw));
  println!(
    "Rate:    ₩{:.2} per $1 ({})",
    snapshot.rate.rate.krw_per_usd(),
    rate_origin_label(&snapshot.rate)
  );
  Ok(())
}

async fn run_tui(client: ApiClient, export_dir: PathBuf) -> Result<()> {
  let mut app = App::new(client, export_dir);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Load initial data.
  let load_result = app.load().await;

  // Run the event loop; restore terminal even on error.
  let run_result = if load_result.is_ok() {
    run_event_loop(&mut terminal, &mut app).await
  } else {
    load_result
  };

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == event::KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(extra: &[&str]) -> Args {
    Args::parse_from(std::iter::once("aidash").chain(extra.iter().copied()))
  }

  #[test]
  fn defaults_apply_without_flags_or_file() {
    let settings = resolve(&args(&[]), ConfigFile::default());
    assert_eq!(settings.api.base_url, "http://localhost:8080");
    assert_eq!(settings.api.timeout, Duration::from_secs(30));
    assert_eq!(settings.export_dir, PathBuf::from("."));
  }

  #[test]
  fn flags_override_file() {
    let file: ConfigFile = toml::from_str(
      "url = \"http://dash.lan:9000\"\ntimeout_secs = 5\nexport_dir = \"/tmp/backups\"",
    )
    .unwrap();
    let settings = resolve(&args(&["--url", "http://other:1"]), file);
    assert_eq!(settings.api.base_url, "http://other:1");
    assert_eq!(settings.api.timeout, Duration::from_secs(5));
    assert_eq!(settings.export_dir, PathBuf::from("/tmp/backups"));
  }

  #[test]
  fn subcommands_parse() {
    assert!(matches!(args(&["summary"]).command, Some(Command::Summary)));
    assert!(matches!(
      args(&["import", "b.json"]).command,
      Some(Command::Import { path }) if path == PathBuf::from("b.json")
    ));
  }
}
