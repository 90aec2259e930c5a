//! Handlers for `/blogs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/blogs` | Most recent first |
//! | `GET`  | `/blogs/{id}` | 404 if not found; `contenido` is passed through verbatim |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use salterio_core::{RecordId, blog::BlogPost, store::SongCatalog};

use crate::error::ApiError;

/// `GET /blogs`
pub async fn list<C>(
  State(catalog): State<Arc<C>>,
) -> Result<Json<Vec<BlogPost>>, ApiError>
where
  C: SongCatalog,
{
  let posts = catalog
    .list_blogs()
    .await
    .map_err(|e| ApiError::Catalog(Box::new(e)))?;
  Ok(Json(posts))
}

/// `GET /blogs/{id}`
pub async fn get_one<C>(
  State(catalog): State<Arc<C>>,
  Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError>
where
  C: SongCatalog,
{
  catalog
    .get_blog(&RecordId::new(id.clone()))
    .await
    .map_err(|e| ApiError::Catalog(Box::new(e)))?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("blog {id}")))
}
