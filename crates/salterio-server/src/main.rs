//! salterio-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `SALTERIO_*` environment variables over it (nested keys use `__`, e.g.
//! `SALTERIO_BACKEND__ANON_KEY`), opens the configured catalog and serves the
//! API under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use salterio_core::store::SongCatalog;
use salterio_remote::RestCatalog;
use salterio_server::{Backend, ServerConfig};
use salterio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Salterio song catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SALTERIO").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let address = server_cfg.address();

  match server_cfg.backend {
    Backend::Remote(remote) => {
      tracing::info!(url = %remote.url, "using remote catalog");
      let catalog =
        RestCatalog::new(remote).context("failed to build HTTP client")?;
      serve(Arc::new(catalog), &address).await
    }
    Backend::Sqlite { path } => {
      let path = expand_tilde(&path);
      tracing::info!(path = %path.display(), "using local catalog");
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      serve(Arc::new(store), &address).await
    }
  }
}

async fn serve<C>(catalog: Arc<C>, address: &str) -> anyhow::Result<()>
where
  C: SongCatalog + 'static,
{
  let app = salterio_server::router(catalog);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
