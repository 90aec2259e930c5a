//! HTTP server for Salterio.
//!
//! Mounts [`salterio_api::api_router`] under `/api` over whichever catalog
//! the configuration selects: the hosted data service or a local SQLite
//! file.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use salterio_core::store::SongCatalog;
use salterio_remote::RemoteConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SALTERIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:    String,
  #[serde(default = "default_port")]
  pub port:    u16,
  pub backend: Backend,
}

/// Where songs and blog posts are read from.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
  /// The hosted PostgREST data service.
  Remote(RemoteConfig),
  /// A local SQLite file, e.g. a client's mirror.
  Sqlite { path: PathBuf },
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 4321 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn router<C>(catalog: Arc<C>) -> Router
where
  C: SongCatalog + 'static,
{
  Router::new()
    .nest("/api", salterio_api::api_router(catalog))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use salterio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn remote_backend_config() {
    let cfg = parse(
      r#"
      port = 8080
      [backend]
      kind = "remote"
      url = "https://example.supabase.co"
      anon_key = "public"
      "#,
    );
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    match cfg.backend {
      Backend::Remote(remote) => assert_eq!(remote.anon_key, "public"),
      other => panic!("unexpected backend: {other:?}"),
    }
  }

  #[test]
  fn sqlite_backend_config() {
    let cfg = parse(
      r#"
      host = "0.0.0.0"
      [backend]
      kind = "sqlite"
      path = "~/salterio.db"
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:4321");
    assert!(matches!(cfg.backend, Backend::Sqlite { .. }));
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());

    let req = Request::get("/api/songs.json").body(Body::empty()).unwrap();
    let resp = router(store.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::get("/songs.json").body(Body::empty()).unwrap();
    let resp = router(store).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
