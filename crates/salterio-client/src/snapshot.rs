//! The static song snapshot published by the site at `/api/songs.json`.

use std::{future::Future, time::Duration};

use reqwest::Client;
use salterio_core::{RecordId, song::Song};
use tracing::debug;

use crate::{Error, Result};

/// Anything that can hand over the full catalog as one list.
pub trait SnapshotSource: Send + Sync {
  fn fetch(&self) -> impl Future<Output = Result<Vec<Song>>> + Send + '_;
}

/// Fetches the snapshot over HTTP.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SnapshotClient {
  client:   Client,
  site_url: String,
}

impl SnapshotClient {
  pub fn new(site_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, site_url: site_url.into() })
  }

  fn url(&self) -> String {
    format!("{}/api/songs.json", self.site_url.trim_end_matches('/'))
  }
}

impl SnapshotSource for SnapshotClient {
  async fn fetch(&self) -> Result<Vec<Song>> {
    let url = self.url();
    debug!(%url, "fetching song snapshot");

    let resp = self.client.get(&url).send().await?;
    if !resp.status().is_success() {
      return Err(Error::SnapshotStatus(resp.status()));
    }
    Ok(resp.json().await?)
  }
}

/// The entry for `id` in a fetched snapshot.
pub fn find(songs: Vec<Song>, id: &RecordId) -> Option<Song> {
  songs.into_iter().find(|s| &s.id == id)
}
