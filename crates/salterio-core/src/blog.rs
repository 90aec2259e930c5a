//! Devotional blog posts.
//!
//! `contenido` is markdown; rendering it is left to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{RecordId, null_as_default, optional_timestamp};

/// Columns of the `blogs` relation that Salterio reads.
pub const BLOG_COLUMNS: &[&str] = &[
  "id",
  "titulo",
  "resumen",
  "contenido",
  "fecha_publicacion",
  "cover_img",
  "podcast_url",
  "video_url",
  "creado_en",
];

/// Columns returned by blog search.
pub const BLOG_SUMMARY_COLUMNS: &[&str] = &["id", "titulo", "resumen"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
  pub id:                RecordId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub titulo:            String,
  #[serde(default)]
  pub resumen:           Option<String>,
  #[serde(default)]
  pub contenido:         Option<String>,
  /// Publication date as entered by the editor (free-form date text).
  #[serde(default)]
  pub fecha_publicacion: Option<String>,
  #[serde(default)]
  pub cover_img:         Option<String>,
  #[serde(default)]
  pub podcast_url:       Option<String>,
  #[serde(default)]
  pub video_url:         Option<String>,
  #[serde(default, with = "optional_timestamp")]
  pub creado_en:         Option<DateTime<Utc>>,
}

impl BlogPost {
  pub fn new(id: impl Into<RecordId>, titulo: impl Into<String>) -> Self {
    Self {
      id:                id.into(),
      titulo:            titulo.into(),
      resumen:           None,
      contenido:         None,
      fecha_publicacion: None,
      cover_img:         None,
      podcast_url:       None,
      video_url:         None,
      creado_en:         None,
    }
  }

  pub fn summary(&self) -> BlogSummary {
    BlogSummary {
      id:      self.id.clone(),
      titulo:  self.titulo.clone(),
      resumen: self.resumen.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogSummary {
  pub id:      RecordId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub titulo:  String,
  #[serde(default)]
  pub resumen: Option<String>,
}
