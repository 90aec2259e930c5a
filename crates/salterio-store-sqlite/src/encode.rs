//! Encoding and decoding helpers between Salterio records and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! width so that lexical order in SQL matches chronological order.
//! `mp3_urls` is stored as a compact JSON array.

use chrono::{DateTime, SecondsFormat, Utc};
use salterio_core::{
  RecordId,
  blog::{BlogPost, BlogSummary},
  record::parse_timestamp,
  song::{Song, SongSummary},
};

use crate::Result;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> { Ok(parse_timestamp(s)?) }

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── URL lists ───────────────────────────────────────────────────────────────

pub fn encode_urls(urls: &[String]) -> Result<String> {
  Ok(serde_json::to_string(urls)?)
}

pub fn decode_urls(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Column order shared by every `SELECT` that builds a [`RawSong`].
pub const SONG_SELECT: &str = "id, titulo, autor, tono, version, cuerpo, \
                               historia, pdf, fundamento_biblico, \
                               youtube_url, mp3_urls, creado_en";

pub const BLOG_SELECT: &str = "id, titulo, resumen, contenido, \
                               fecha_publicacion, cover_img, podcast_url, \
                               video_url, creado_en";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `cantos` row.
pub struct RawSong {
  pub id:                 String,
  pub titulo:             String,
  pub autor:              Option<String>,
  pub tono:               Option<String>,
  pub version:            Option<String>,
  pub cuerpo:             Option<String>,
  pub historia:           Option<String>,
  pub pdf:                Option<String>,
  pub fundamento_biblico: Option<String>,
  pub youtube_url:        Option<String>,
  pub mp3_urls:           String,
  pub creado_en:          Option<String>,
}

impl RawSong {
  /// Read a row selected with [`SONG_SELECT`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      titulo:             row.get(1)?,
      autor:              row.get(2)?,
      tono:               row.get(3)?,
      version:            row.get(4)?,
      cuerpo:             row.get(5)?,
      historia:           row.get(6)?,
      pdf:                row.get(7)?,
      fundamento_biblico: row.get(8)?,
      youtube_url:        row.get(9)?,
      mp3_urls:           row.get(10)?,
      creado_en:          row.get(11)?,
    })
  }

  /// Flatten `song` into column values, in [`SONG_SELECT`] order.
  pub fn encode(song: Song) -> Result<Self> {
    Ok(Self {
      id:                 song.id.as_str().to_owned(),
      titulo:             song.titulo,
      autor:              song.autor,
      tono:               song.tono,
      version:            song.version,
      cuerpo:             song.cuerpo,
      historia:           song.historia,
      pdf:                song.pdf,
      fundamento_biblico: song.fundamento_biblico,
      youtube_url:        song.youtube_url,
      mp3_urls:           encode_urls(&song.mp3_urls)?,
      creado_en:          song.creado_en.map(encode_dt),
    })
  }

  pub fn into_song(self) -> Result<Song> {
    Ok(Song {
      id:                 RecordId::new(self.id),
      titulo:             self.titulo,
      autor:              self.autor,
      tono:               self.tono,
      version:            self.version,
      cuerpo:             self.cuerpo,
      historia:           self.historia,
      pdf:                self.pdf,
      fundamento_biblico: self.fundamento_biblico,
      youtube_url:        self.youtube_url,
      mp3_urls:           decode_urls(&self.mp3_urls)?,
      creado_en:          decode_opt_dt(self.creado_en)?,
    })
  }
}

/// Raw values from the `id, titulo, autor, tono` projection.
pub struct RawSongSummary {
  pub id:     String,
  pub titulo: String,
  pub autor:  Option<String>,
  pub tono:   Option<String>,
}

impl RawSongSummary {
  pub fn into_summary(self) -> SongSummary {
    SongSummary {
      id:     RecordId::new(self.id),
      titulo: self.titulo,
      autor:  self.autor,
      tono:   self.tono,
    }
  }
}

/// Raw values read directly from a `blogs` row.
pub struct RawBlog {
  pub id:                String,
  pub titulo:            String,
  pub resumen:           Option<String>,
  pub contenido:         Option<String>,
  pub fecha_publicacion: Option<String>,
  pub cover_img:         Option<String>,
  pub podcast_url:       Option<String>,
  pub video_url:         Option<String>,
  pub creado_en:         Option<String>,
}

impl RawBlog {
  /// Read a row selected with [`BLOG_SELECT`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      titulo:            row.get(1)?,
      resumen:           row.get(2)?,
      contenido:         row.get(3)?,
      fecha_publicacion: row.get(4)?,
      cover_img:         row.get(5)?,
      podcast_url:       row.get(6)?,
      video_url:         row.get(7)?,
      creado_en:         row.get(8)?,
    })
  }

  pub fn encode(post: BlogPost) -> Self {
    Self {
      id:                post.id.as_str().to_owned(),
      titulo:            post.titulo,
      resumen:           post.resumen,
      contenido:         post.contenido,
      fecha_publicacion: post.fecha_publicacion,
      cover_img:         post.cover_img,
      podcast_url:       post.podcast_url,
      video_url:         post.video_url,
      creado_en:         post.creado_en.map(encode_dt),
    }
  }

  pub fn into_blog(self) -> Result<BlogPost> {
    Ok(BlogPost {
      id:                RecordId::new(self.id),
      titulo:            self.titulo,
      resumen:           self.resumen,
      contenido:         self.contenido,
      fecha_publicacion: self.fecha_publicacion,
      cover_img:         self.cover_img,
      podcast_url:       self.podcast_url,
      video_url:         self.video_url,
      creado_en:         decode_opt_dt(self.creado_en)?,
    })
  }
}

/// Raw values from the `id, titulo, resumen` projection.
pub struct RawBlogSummary {
  pub id:      String,
  pub titulo:  String,
  pub resumen: Option<String>,
}

impl RawBlogSummary {
  pub fn into_summary(self) -> BlogSummary {
    BlogSummary {
      id:      RecordId::new(self.id),
      titulo:  self.titulo,
      resumen: self.resumen,
    }
  }
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// A `%term%` pattern for `LIKE … ESCAPE '\'`, with the term's own wildcards
/// escaped.
pub fn like_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}
