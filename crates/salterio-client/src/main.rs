//! `salterio`: offline-first command-line client.
//!
//! # Usage
//!
//! ```text
//! salterio sync --watch
//! salterio show 42 --transpose -2
//! salterio search "santo"
//! salterio favorites add 42
//! salterio volume 0.5
//! ```
//!
//! Every subcommand accepts `--config <FILE>` and the flags of
//! [`ConfigArgs`]; most also read `SALTERIO_*` environment variables.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use salterio_client::{
  config::{ClientConfig, ConfigArgs},
  prefs::Preferences,
  resolver::{Provenance, SongResolver},
  scheduler::{AlwaysOnline, SyncScheduler},
  snapshot::SnapshotClient,
  sync::{MirrorEvents, SyncAgent, SyncOutcome},
};
use salterio_core::{
  RecordId,
  song::Song,
  store::{SEARCH_LIMIT, SongCatalog},
};
use salterio_remote::RestCatalog;
use salterio_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "salterio", version, about = "Offline-first Salterio client")]
struct Cli {
  #[command(flatten)]
  config: ConfigArgs,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Pull new and changed songs into the local mirror.
  Sync {
    /// Keep running and sync on the configured interval.
    #[arg(long)]
    watch: bool,
  },
  /// Print a song, resolved from the best available source.
  Show {
    id: String,
    /// Semitones to shift the chords by.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    transpose: i32,
    /// Print compiled HTML instead of the annotated text.
    #[arg(long, conflicts_with = "json")]
    html: bool,
    /// Print the rendered song as JSON.
    #[arg(long)]
    json: bool,
    /// Seconds to wait for better sources before printing.
    #[arg(long, default_value_t = 5)]
    wait: u64,
  },
  /// Search mirrored songs by title or author.
  Search { term: String },
  /// Manage favorite songs.
  Favorites {
    #[command(subcommand)]
    action: Option<FavoritesAction>,
  },
  /// Show or set the player volume (0.0 to 1.0).
  Volume { value: Option<f32> },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
  List,
  Add { id: String },
  Remove { id: String },
  Toggle { id: String },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = ClientConfig::load(cli.config).context("loading configuration")?;

  match cli.command {
    Command::Sync { watch } => sync(&config, watch).await,
    Command::Show { id, transpose, html, json, wait } => {
      show(&config, RecordId::new(id), transpose, html, json, wait).await
    }
    Command::Search { term } => search(&config, &term).await,
    Command::Favorites { action } => {
      favorites(&config, action.unwrap_or(FavoritesAction::List)).await
    }
    Command::Volume { value } => volume(&config, value).await,
  }
}

async fn open_store(config: &ClientConfig) -> Result<Arc<SqliteStore>> {
  let path = &config.store_path;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  let store = SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open mirror at {path:?}"))?;
  Ok(Arc::new(store))
}

fn remote(config: &ClientConfig) -> Result<Option<Arc<RestCatalog>>> {
  config
    .remote
    .clone()
    .map(|r| RestCatalog::new(r).map(Arc::new))
    .transpose()
    .context("failed to build HTTP client")
}

// ─── Sync ────────────────────────────────────────────────────────────────────

async fn sync(config: &ClientConfig, watch: bool) -> Result<()> {
  let Some(remote) = remote(config)? else {
    bail!("no data service configured; set --data-url and --anon-key");
  };
  let store = open_store(config).await?;
  let agent = Arc::new(SyncAgent::new(
    remote,
    store,
    config.policy,
    config.context,
  ));

  if !watch {
    match agent.run_cycle().await? {
      SyncOutcome::Disabled => println!("sync is disabled for this client"),
      SyncOutcome::AlreadyRunning => println!("a sync is already running"),
      SyncOutcome::Synced { rows } => println!("{rows} song(s) updated"),
    }
    return Ok(());
  }

  let mut state = agent.subscribe();
  let scheduler =
    SyncScheduler::start(agent.clone(), config.sync_interval, AlwaysOnline);
  tracing::info!(
    interval_secs = config.sync_interval.as_secs(),
    "watching; press Ctrl-C to stop"
  );

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => break,
      changed = state.changed() => {
        if changed.is_err() {
          break;
        }
        let s = state.borrow_and_update().clone();
        tracing::debug!(status = %s.status, last_sync = ?s.last_sync, "sync state");
      }
    }
  }

  scheduler.stop();
  Ok(())
}

// ─── Show ────────────────────────────────────────────────────────────────────

async fn show(
  config: &ClientConfig,
  id: RecordId,
  delta: i32,
  html: bool,
  json: bool,
  wait: u64,
) -> Result<()> {
  // The record a server-rendered page would have embedded.
  let server: Option<Song> = match remote(config)? {
    Some(remote) => remote.get_song(&id).await.unwrap_or_else(|e| {
      tracing::warn!(%id, error = %e, "data service lookup failed");
      None
    }),
    None => None,
  };

  let snapshot = Arc::new(
    SnapshotClient::new(config.site_url.clone())
      .context("failed to build HTTP client")?,
  );
  let mut resolver = SongResolver::new(snapshot);
  if config.context.installed {
    resolver = resolver.with_mirror(open_store(config).await?, MirrorEvents::new());
  }

  let mut view = resolver.open(id, server);
  let deadline = tokio::time::Instant::now() + Duration::from_secs(wait);
  while view.current().provenance != Provenance::Mirror {
    match tokio::time::timeout_at(deadline, view.changed()).await {
      Ok(Some(_)) => {}
      Ok(None) | Err(_) => break,
    }
  }
  let resolved = view.current();
  view.close();

  tracing::info!(provenance = %resolved.provenance, "resolved song");
  let rendered = salterio_lyrics::render_song(&resolved.song, delta);

  if json {
    println!("{}", serde_json::to_string_pretty(&rendered)?);
  } else if html {
    println!("{}", rendered.html);
  } else {
    println!("{}", rendered.titulo);
    if let Some(tono) = &rendered.tono {
      println!("Tono: {tono}");
    }
    println!();
    println!("{}", salterio_lyrics::transpose(resolved.song.body(), delta));
  }
  Ok(())
}

// ─── Search ──────────────────────────────────────────────────────────────────

async fn search(config: &ClientConfig, term: &str) -> Result<()> {
  let term = term.trim();
  if term.chars().count() < 2 {
    bail!("search term must be at least 2 characters");
  }
  let store = open_store(config).await?;
  let hits = store
    .search_songs(term, SEARCH_LIMIT)
    .await
    .context("searching the mirror")?;

  for hit in hits {
    let autor = hit.autor.as_deref().unwrap_or("-");
    let tono = hit.tono.as_deref().unwrap_or("-");
    println!("{:>6}  {}  ({autor}, {tono})", hit.id.as_str(), hit.titulo);
  }
  Ok(())
}

// ─── Preferences ─────────────────────────────────────────────────────────────

async fn favorites(config: &ClientConfig, action: FavoritesAction) -> Result<()> {
  let store = open_store(config).await?;
  let prefs = Preferences::new(store);

  match action {
    FavoritesAction::List => {
      for (id, song) in prefs.favorite_songs().await? {
        let titulo = song.map(|s| s.titulo).unwrap_or_default();
        println!("{:>6}  {titulo}", id.as_str());
      }
    }
    FavoritesAction::Add { id } => {
      if !prefs.add_favorite(RecordId::new(id)).await? {
        println!("already a favorite");
      }
    }
    FavoritesAction::Remove { id } => {
      if !prefs.remove_favorite(&RecordId::new(id)).await? {
        println!("not a favorite");
      }
    }
    FavoritesAction::Toggle { id } => {
      let now = prefs.toggle_favorite(RecordId::new(id)).await?;
      println!("{}", if now { "added" } else { "removed" });
    }
  }
  Ok(())
}

async fn volume(config: &ClientConfig, value: Option<f32>) -> Result<()> {
  let prefs = Preferences::new(open_store(config).await?);
  let volume = match value {
    Some(v) => prefs.set_volume(v).await?,
    None => prefs.volume().await?,
  };
  println!("{volume}");
  Ok(())
}
