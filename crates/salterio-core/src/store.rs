//! The `SongCatalog` and `SongMirror` traits and supporting query types.
//!
//! A catalog is any read-only source of songs and blog posts: the remote data
//! service (`salterio-remote`) or a local SQLite file
//! (`salterio-store-sqlite`). A mirror is the on-device copy of the song
//! catalog that the sync agent keeps fresh and the resolver reads from.

use std::future::Future;

use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  RecordId,
  blog::{BlogPost, BlogSummary},
  song::{Song, SongSummary},
};

/// Durable key holding the sync watermark.
pub const LAST_SYNC_KEY: &str = "last_sync_timestamp";

/// Default cap on search results per relation.
pub const SEARCH_LIMIT: usize = 5;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`SongCatalog::list_songs`]. Results are always ordered by
/// title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongQuery {
  /// Only rows whose `creado_en` is strictly after this instant.
  pub created_after: Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
}

impl SongQuery {
  /// Every song.
  pub fn all() -> Self { Self::default() }

  /// Songs created or modified strictly after `watermark`; all songs when
  /// `watermark` is `None`.
  pub fn since(watermark: Option<DateTime<Utc>>) -> Self {
    Self { created_after: watermark, limit: None }
  }
}

/// Secondary lookups supported by the mirror. The string form of each
/// variant is the column it covers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum MirrorIndex {
  Titulo,
  Tono,
  Autor,
  Version,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read access to the song and blog catalog.
///
/// All methods return `Send` futures so implementations can be shared across
/// a multi-threaded runtime (e.g. tokio with `axum`).
pub trait SongCatalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Songs matching `query`, ordered by title.
  fn list_songs<'a>(
    &'a self,
    query: &'a SongQuery,
  ) -> impl Future<Output = Result<Vec<Song>, Self::Error>> + Send + 'a;

  /// Retrieve a song by id. Returns `None` if not found.
  fn get_song<'a>(
    &'a self,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<Option<Song>, Self::Error>> + Send + 'a;

  /// Case-insensitive substring search over `titulo` and `autor`.
  fn search_songs<'a>(
    &'a self,
    term: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SongSummary>, Self::Error>> + Send + 'a;

  /// Case-insensitive substring search over `titulo` and `resumen`.
  fn search_blogs<'a>(
    &'a self,
    term: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<BlogSummary>, Self::Error>> + Send + 'a;

  /// All blog posts, most recent first.
  fn list_blogs(
    &self,
  ) -> impl Future<Output = Result<Vec<BlogPost>, Self::Error>> + Send + '_;

  fn get_blog<'a>(
    &'a self,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<Option<BlogPost>, Self::Error>> + Send + 'a;
}

/// The local persistent copy of the song catalog plus the durable client
/// settings that live next to it.
///
/// The sync agent is the only writer of songs; any number of readers may run
/// concurrently. Rows are never deleted.
pub trait SongMirror: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Number of songs currently mirrored.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn get<'a>(
    &'a self,
    id: &'a RecordId,
  ) -> impl Future<Output = Result<Option<Song>, Self::Error>> + Send + 'a;

  /// Insert or overwrite every song, keyed by id. Returns the number of rows
  /// written.
  fn upsert_songs(
    &self,
    songs: Vec<Song>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Exact-match lookup on a secondary index.
  fn find_by<'a>(
    &'a self,
    index: MirrorIndex,
    value: &'a str,
  ) -> impl Future<Output = Result<Vec<Song>, Self::Error>> + Send + 'a;

  /// Read a durable string setting.
  fn get_setting<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write (or overwrite) a durable string setting.
  fn put_setting<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
