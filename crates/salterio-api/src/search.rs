//! Handler for `GET /search`.
//!
//! Searches songs (over `titulo` and `autor`) and blog posts (over `titulo`
//! and `resumen`) concurrently. A half that fails is logged and reported as
//! empty so the other half still reaches the client.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use salterio_core::{
  blog::BlogSummary,
  song::SongSummary,
  store::{SEARCH_LIMIT, SongCatalog},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Terms shorter than this (after trimming) return no results.
pub const MIN_TERM_CHARS: usize = 2;

pub const SEARCH_CACHE_CONTROL: &str = "max-age=60";

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
  pub songs: Vec<SongSummary>,
  pub blogs: Vec<BlogSummary>,
}

/// `GET /search?q=<term>`
pub async fn handler<C>(
  State(catalog): State<Arc<C>>,
  Query(params): Query<SearchParams>,
) -> Response
where
  C: SongCatalog,
{
  let term = params.q.trim();
  if term.chars().count() < MIN_TERM_CHARS {
    return Json(SearchResults::default()).into_response();
  }

  let (songs, blogs) = tokio::join!(
    catalog.search_songs(term, SEARCH_LIMIT),
    catalog.search_blogs(term, SEARCH_LIMIT),
  );

  let songs = songs.unwrap_or_else(|e| {
    warn!(error = %e, term, "song search failed");
    Vec::new()
  });
  let blogs = blogs.unwrap_or_else(|e| {
    warn!(error = %e, term, "blog search failed");
    Vec::new()
  });

  (
    [(header::CACHE_CONTROL, SEARCH_CACHE_CONTROL)],
    Json(SearchResults { songs, blogs }),
  )
    .into_response()
}
