//! Error type for `salterio-remote`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a non-2xx status.
  #[error("GET {relation} → {status}: {body}")]
  Status {
    relation: &'static str,
    status:   StatusCode,
    body:     String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
