//! JSON/HTML HTTP API for Salterio.
//!
//! Exposes an axum [`Router`] backed by any
//! [`salterio_core::store::SongCatalog`]: the remote data service in
//! production, a local SQLite file for offline development.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", salterio_api::api_router(catalog.clone()))
//! ```

pub mod blogs;
pub mod error;
pub mod etag;
pub mod search;
pub mod songs;

use std::sync::Arc;

use axum::{Router, routing::get};
use salterio_core::store::SongCatalog;

pub use error::ApiError;

/// Build a fully-materialised API router for `catalog`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C>(catalog: Arc<C>) -> Router<()>
where
  C: SongCatalog + 'static,
{
  Router::new()
    // Songs
    .route("/songs.json", get(songs::snapshot::<C>))
    .route("/songs/{id}", get(songs::get_one::<C>))
    .route("/songs/{id}/lyrics", get(songs::lyrics::<C>))
    // Search
    .route("/search", get(search::handler::<C>))
    // Blogs
    .route("/blogs", get(blogs::list::<C>))
    .route("/blogs/{id}", get(blogs::get_one::<C>))
    .with_state(catalog)
}

#[cfg(test)]
mod tests {
  use std::future::Future;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use salterio_core::{
    RecordId,
    blog::{BlogPost, BlogSummary},
    song::{Song, SongSummary},
    store::{SongMirror, SongQuery},
  };
  use salterio_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  async fn seeded() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let mut santo = Song::new("1", "Santo");
    santo.tono = Some("G".into());
    santo.autor = Some("Anónimo".into());
    santo.cuerpo = Some("[Coro:]\n{G}Santo".into());
    let mut aleluya = Song::new("2", "Aleluya");
    aleluya.autor = Some("Hermanos del Santo Nombre".into());
    store.upsert_songs(vec![santo, aleluya]).await.unwrap();

    let mut post = BlogPost::new("10", "Santos de abril");
    post.resumen = Some("Memorias".into());
    post.fecha_publicacion = Some("2024-04-01".into());
    store.upsert_blogs(vec![post]).await.unwrap();

    Arc::new(store)
  }

  async fn get<C: SongCatalog + 'static>(
    catalog: Arc<C>,
    uri: &str,
    headers: Vec<(header::HeaderName, &str)>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::empty()).unwrap();
    api_router(catalog).oneshot(req).await.unwrap()
  }

  async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
  }

  // ── Snapshot ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn snapshot_is_sorted_and_cacheable() {
    let resp = get(seeded().await, "/songs.json", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CACHE_CONTROL).unwrap(),
      "public, max-age=3600"
    );
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "application/json"
    );
    assert!(resp.headers().contains_key(header::ETAG));

    let json = body_json(resp).await;
    let titles: Vec<_> = json
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["titulo"].as_str().unwrap())
      .collect();
    assert_eq!(titles, ["Aleluya", "Santo"]);
  }

  #[tokio::test]
  async fn snapshot_revalidation_returns_304() {
    let catalog = seeded().await;
    let first = get(catalog.clone(), "/songs.json", vec![]).await;
    let etag = first
      .headers()
      .get(header::ETAG)
      .unwrap()
      .to_str()
      .unwrap()
      .to_owned();

    let again =
      get(catalog.clone(), "/songs.json", vec![(header::IF_NONE_MATCH, etag.as_str())])
        .await;
    assert_eq!(again.status(), StatusCode::NOT_MODIFIED);
    assert!(body_string(again).await.is_empty());

    catalog
      .upsert_songs(vec![Song::new("3", "Cordero")])
      .await
      .unwrap();
    let changed =
      get(catalog, "/songs.json", vec![(header::IF_NONE_MATCH, etag.as_str())]).await;
    assert_eq!(changed.status(), StatusCode::OK);
  }

  // ── Songs ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn get_song_and_missing_song() {
    let catalog = seeded().await;

    let resp = get(catalog.clone(), "/songs/1", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["id"], "1");
    assert_eq!(json["tono"], "G");

    let resp = get(catalog, "/songs/99", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn lyrics_are_compiled_and_transposed() {
    let catalog = seeded().await;

    let resp = get(catalog.clone(), "/songs/1/lyrics", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
      resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html")
    );
    let html = body_string(resp).await;
    assert!(html.starts_with("<b class=\"titulo\">Coro:</b>"));
    assert!(html.contains("data-content=\"G\">Sa</nota>nto"));

    let html =
      body_string(get(catalog.clone(), "/songs/1/lyrics?transpose=-2", vec![]).await)
        .await;
    assert!(html.contains("data-content=\"F\">Sa</nota>nto"));

    let resp = get(catalog, "/songs/2/lyrics", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.is_empty());
  }

  #[tokio::test]
  async fn lyrics_accept_extreme_transpositions() {
    let catalog = seeded().await;

    let resp = get(catalog.clone(), "/songs/1/lyrics?transpose=2147483647", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("data-content=\"D\">Sa</nota>nto"));

    let resp = get(catalog, "/songs/1/lyrics?transpose=-2147483648", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("data-content=\"B\">Sa</nota>nto"));
  }

  // ── Search ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_covers_songs_and_blogs() {
    let resp = get(seeded().await, "/search?q=%20santo%20", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "max-age=60");

    let json = body_json(resp).await;
    let songs: Vec<_> = json["songs"]
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["id"].as_str().unwrap())
      .collect();
    // "Aleluya" matches through its author.
    assert_eq!(songs, ["2", "1"]);
    assert_eq!(json["blogs"][0]["titulo"], "Santos de abril");
  }

  #[tokio::test]
  async fn short_terms_return_empty_results() {
    for uri in ["/search", "/search?q=", "/search?q=%20a%20"] {
      let resp = get(seeded().await, uri, vec![]).await;
      assert_eq!(resp.status(), StatusCode::OK);
      assert!(!resp.headers().contains_key(header::CACHE_CONTROL));
      let json = body_json(resp).await;
      assert_eq!(json, serde_json::json!({ "songs": [], "blogs": [] }));
    }
  }

  // ── Blogs ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn blogs_list_and_get() {
    let catalog = seeded().await;

    let json = body_json(get(catalog.clone(), "/blogs", vec![]).await).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let json = body_json(get(catalog.clone(), "/blogs/10", vec![]).await).await;
    assert_eq!(json["resumen"], "Memorias");

    let resp = get(catalog, "/blogs/11", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Failing catalog ─────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("catalog offline")]
  struct Offline;

  /// Songs fail; blogs succeed.
  struct HalfBroken;

  impl SongCatalog for HalfBroken {
    type Error = Offline;

    fn list_songs<'a>(
      &'a self,
      _: &'a SongQuery,
    ) -> impl Future<Output = Result<Vec<Song>, Offline>> + Send + 'a {
      async { Err(Offline) }
    }

    fn get_song<'a>(
      &'a self,
      _: &'a RecordId,
    ) -> impl Future<Output = Result<Option<Song>, Offline>> + Send + 'a {
      async { Err(Offline) }
    }

    fn search_songs<'a>(
      &'a self,
      _: &'a str,
      _: usize,
    ) -> impl Future<Output = Result<Vec<SongSummary>, Offline>> + Send + 'a {
      async { Err(Offline) }
    }

    fn search_blogs<'a>(
      &'a self,
      _: &'a str,
      _: usize,
    ) -> impl Future<Output = Result<Vec<BlogSummary>, Offline>> + Send + 'a {
      async {
        Ok(vec![BlogSummary {
          id:      RecordId::new("5"),
          titulo:  "Adviento".into(),
          resumen: None,
        }])
      }
    }

    fn list_blogs(
      &self,
    ) -> impl Future<Output = Result<Vec<BlogPost>, Offline>> + Send + '_ {
      async { Ok(vec![]) }
    }

    fn get_blog<'a>(
      &'a self,
      _: &'a RecordId,
    ) -> impl Future<Output = Result<Option<BlogPost>, Offline>> + Send + 'a {
      async { Ok(None) }
    }
  }

  #[tokio::test]
  async fn catalog_failure_is_a_json_500() {
    let resp = get(Arc::new(HalfBroken), "/songs.json", vec![]).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "catalog offline");
  }

  #[tokio::test]
  async fn failing_search_half_is_empty() {
    let resp = get(Arc::new(HalfBroken), "/search?q=adv", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["songs"], serde_json::json!([]));
    assert_eq!(json["blogs"][0]["id"], "5");
  }
}
