//! [`RestCatalog`]: the remote implementation of [`SongCatalog`].

use std::time::Duration;

use reqwest::Client;
use salterio_core::{
  RecordId,
  blog::{BLOG_COLUMNS, BLOG_SUMMARY_COLUMNS, BlogPost, BlogSummary},
  song::{SONG_COLUMNS, SONG_SUMMARY_COLUMNS, Song, SongSummary},
  store::{SongCatalog, SongQuery},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
  Error, Result,
  query::{self, BLOGS, Params, SONGS},
};

/// Connection settings for the data service.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Project URL, e.g. `https://xyz.supabase.co`.
  pub url:      String,
  /// Public anonymous key, sent as both `apikey` and bearer token.
  pub anon_key: String,
}

/// Read-only catalog backed by the remote PostgREST service.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RestCatalog {
  client: Client,
  config: RemoteConfig,
}

impl RestCatalog {
  pub fn new(config: RemoteConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, relation: &str) -> String {
    format!(
      "{}/rest/v1/{}",
      self.config.url.trim_end_matches('/'),
      relation
    )
  }

  /// `GET /rest/v1/<relation>?<params>`, decoded as a JSON array.
  async fn fetch<T: DeserializeOwned>(
    &self,
    relation: &'static str,
    params: Params,
  ) -> Result<Vec<T>> {
    debug!(relation, ?params, "remote query");

    let resp = self
      .client
      .get(self.url(relation))
      .header("apikey", &self.config.anon_key)
      .bearer_auth(&self.config.anon_key)
      .query(&params)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { relation, status, body });
    }
    Ok(resp.json().await?)
  }

  async fn fetch_one<T: DeserializeOwned>(
    &self,
    relation: &'static str,
    params: Params,
  ) -> Result<Option<T>> {
    Ok(self.fetch(relation, params).await?.into_iter().next())
  }
}

impl SongCatalog for RestCatalog {
  type Error = Error;

  async fn list_songs(&self, query: &SongQuery) -> Result<Vec<Song>> {
    self
      .fetch(SONGS, query::list_songs(SONG_COLUMNS, query))
      .await
  }

  async fn get_song(&self, id: &RecordId) -> Result<Option<Song>> {
    self.fetch_one(SONGS, query::by_id(SONG_COLUMNS, id)).await
  }

  async fn search_songs(
    &self,
    term: &str,
    limit: usize,
  ) -> Result<Vec<SongSummary>> {
    let params =
      query::search(SONG_SUMMARY_COLUMNS, &["titulo", "autor"], term, limit);
    self.fetch(SONGS, params).await
  }

  async fn search_blogs(
    &self,
    term: &str,
    limit: usize,
  ) -> Result<Vec<BlogSummary>> {
    let params =
      query::search(BLOG_SUMMARY_COLUMNS, &["titulo", "resumen"], term, limit);
    self.fetch(BLOGS, params).await
  }

  async fn list_blogs(&self) -> Result<Vec<BlogPost>> {
    self.fetch(BLOGS, query::list_blogs(BLOG_COLUMNS)).await
  }

  async fn get_blog(&self, id: &RecordId) -> Result<Option<BlogPost>> {
    self.fetch_one(BLOGS, query::by_id(BLOG_COLUMNS, id)).await
  }
}
