//! Handlers for song endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/songs.json` | Full snapshot sorted by title; cacheable, `ETag` / `304` |
//! | `GET`  | `/songs/{id}` | 404 if not found |
//! | `GET`  | `/songs/{id}/lyrics` | Compiled HTML; optional `?transpose=<semitones>` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{Html, IntoResponse, Response},
};
use salterio_core::{
  RecordId,
  song::Song,
  store::{SongCatalog, SongQuery},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

/// Snapshot responses may be cached by clients and the service worker for an
/// hour.
pub const SNAPSHOT_CACHE_CONTROL: &str = "public, max-age=3600";

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// `GET /songs.json`
pub async fn snapshot<C>(
  State(catalog): State<Arc<C>>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  C: SongCatalog,
{
  let songs = catalog
    .list_songs(&SongQuery::all())
    .await
    .map_err(|e| ApiError::Catalog(Box::new(e)))?;
  let body =
    serde_json::to_vec(&songs).map_err(|e| ApiError::Catalog(Box::new(e)))?;
  let etag = compute_etag(&body);

  let cached = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| if_none_match(v, &etag));

  let cache_headers = [
    (header::CACHE_CONTROL, SNAPSHOT_CACHE_CONTROL.to_owned()),
    (header::ETAG, etag),
  ];
  if cached {
    return Ok((StatusCode::NOT_MODIFIED, cache_headers).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [(header::CONTENT_TYPE, "application/json")],
      cache_headers,
      body,
    )
      .into_response(),
  )
}

// ─── Get one ─────────────────────────────────────────────────────────────────

async fn find<C>(catalog: &C, id: String) -> Result<Song, ApiError>
where
  C: SongCatalog,
{
  catalog
    .get_song(&RecordId::new(id.clone()))
    .await
    .map_err(|e| ApiError::Catalog(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("song {id}")))
}

/// `GET /songs/{id}`
pub async fn get_one<C>(
  State(catalog): State<Arc<C>>,
  Path(id): Path<String>,
) -> Result<Json<Song>, ApiError>
where
  C: SongCatalog,
{
  Ok(Json(find(catalog.as_ref(), id).await?))
}

// ─── Lyrics ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct LyricsParams {
  /// Semitone delta; negative moves down.
  #[serde(default)]
  pub transpose: i32,
}

/// `GET /songs/{id}/lyrics[?transpose=<n>]`
pub async fn lyrics<C>(
  State(catalog): State<Arc<C>>,
  Path(id): Path<String>,
  Query(params): Query<LyricsParams>,
) -> Result<Html<String>, ApiError>
where
  C: SongCatalog,
{
  let song = find(catalog.as_ref(), id).await?;
  Ok(Html(salterio_lyrics::render(song.body(), params.transpose)))
}
