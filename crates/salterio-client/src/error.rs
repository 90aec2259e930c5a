//! Error type for `salterio-client`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("remote catalog error: {0}")]
  Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("mirror error: {0}")]
  Mirror(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("snapshot request failed: {0}")]
  Snapshot(#[from] reqwest::Error),

  #[error("snapshot request returned {0}")]
  SnapshotStatus(reqwest::StatusCode),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("config error: {0}")]
  Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub(crate) fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Remote(Box::new(e))
  }

  pub(crate) fn mirror(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Mirror(Box::new(e))
  }
}
