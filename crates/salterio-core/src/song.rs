//! Song ("canto") records.
//!
//! A song is a read-only snapshot of a row in the remote `cantos` relation.
//! Its `cuerpo` is the annotated lyrics body consumed by `salterio-lyrics`;
//! every other field is descriptive metadata passed through untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{RecordId, null_as_default, optional_timestamp};

/// Title shown while the real record is still being fetched.
pub const PLACEHOLDER_TITLE: &str = "Cargando...";

/// Every column of the `cantos` relation, in the order the data service
/// exposes them.
pub const SONG_COLUMNS: &[&str] = &[
  "id",
  "titulo",
  "tono",
  "autor",
  "version",
  "cuerpo",
  "historia",
  "pdf",
  "fundamento_biblico",
  "youtube_url",
  "mp3_urls",
  "creado_en",
];

/// Columns returned by song search.
pub const SONG_SUMMARY_COLUMNS: &[&str] = &["id", "titulo", "autor", "tono"];

/// A song with its annotated lyrics and optional media references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
  pub id:                 RecordId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub titulo:             String,
  #[serde(default)]
  pub autor:              Option<String>,
  /// Home key, e.g. `"G"` or `"Em"`.
  #[serde(default)]
  pub tono:               Option<String>,
  #[serde(default)]
  pub version:            Option<String>,
  /// Raw annotated body with `[Label:]` headers and `{Chord}` tokens.
  #[serde(default)]
  pub cuerpo:             Option<String>,
  #[serde(default)]
  pub historia:           Option<String>,
  #[serde(default)]
  pub pdf:                Option<String>,
  #[serde(default)]
  pub fundamento_biblico: Option<String>,
  #[serde(default)]
  pub youtube_url:        Option<String>,
  /// Audio sources in playback order.
  #[serde(default, deserialize_with = "null_as_default")]
  pub mp3_urls:           Vec<String>,
  /// Creation/modification time; the sync watermark is compared against it.
  #[serde(default, with = "optional_timestamp")]
  pub creado_en:          Option<DateTime<Utc>>,
}

impl Song {
  /// A record with only an id and title; every optional field is empty.
  pub fn new(id: impl Into<RecordId>, titulo: impl Into<String>) -> Self {
    Self {
      id:                 id.into(),
      titulo:             titulo.into(),
      autor:              None,
      tono:               None,
      version:            None,
      cuerpo:             None,
      historia:           None,
      pdf:                None,
      fundamento_biblico: None,
      youtube_url:        None,
      mp3_urls:           Vec::new(),
      creado_en:          None,
    }
  }

  /// The record rendered while nothing better is available.
  pub fn placeholder(id: RecordId) -> Self {
    Self { cuerpo: Some(String::new()), ..Self::new(id, PLACEHOLDER_TITLE) }
  }

  /// Whether the record carries a non-empty lyrics body.
  pub fn has_body(&self) -> bool {
    self.cuerpo.as_deref().is_some_and(|c| !c.is_empty())
  }

  /// The lyrics body, or `""` when absent.
  pub fn body(&self) -> &str { self.cuerpo.as_deref().unwrap_or_default() }

  pub fn summary(&self) -> SongSummary {
    SongSummary {
      id:     self.id.clone(),
      titulo: self.titulo.clone(),
      autor:  self.autor.clone(),
      tono:   self.tono.clone(),
    }
  }
}

/// The projection returned by song search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongSummary {
  pub id:     RecordId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub titulo: String,
  #[serde(default)]
  pub autor:  Option<String>,
  #[serde(default)]
  pub tono:   Option<String>,
}
