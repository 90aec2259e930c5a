//! [`SqliteStore`]: the SQLite implementation of [`SongMirror`] and
//! [`SongCatalog`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};
use salterio_core::{
  RecordId,
  blog::{BlogPost, BlogSummary},
  song::{Song, SongSummary},
  store::{MirrorIndex, SongCatalog, SongMirror, SongQuery},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    BLOG_SELECT, RawBlog, RawBlogSummary, RawSong, RawSongSummary, SONG_SELECT,
    encode_dt, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Salterio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or overwrite blog posts, keyed by id. Used to seed a local
  /// catalog; the sync agent never writes blogs.
  pub async fn upsert_blogs(&self, posts: Vec<BlogPost>) -> Result<usize> {
    let raws: Vec<RawBlog> = posts.into_iter().map(RawBlog::encode).collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT OR REPLACE INTO blogs ({BLOG_SELECT})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
          ))?;
          for r in &raws {
            stmt.execute(rusqlite::params![
              r.id,
              r.titulo,
              r.resumen,
              r.contenido,
              r.fecha_publicacion,
              r.cover_img,
              r.podcast_url,
              r.video_url,
              r.creado_en,
            ])?;
          }
        }
        tx.commit()?;
        Ok(raws.len())
      })
      .await?;

    Ok(written)
  }

  async fn query_songs(
    &self,
    sql: String,
    params: Vec<Value>,
  ) -> Result<Vec<Song>> {
    let raws: Vec<RawSong> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSong::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSong::into_song).collect()
  }
}

// ─── SongMirror impl ─────────────────────────────────────────────────────────

impl SongMirror for SqliteStore {
  type Error = Error;

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM cantos", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn get(&self, id: &RecordId) -> Result<Option<Song>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawSong> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SONG_SELECT} FROM cantos WHERE id = ?1"),
              rusqlite::params![id_str],
              RawSong::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSong::into_song).transpose()
  }

  async fn upsert_songs(&self, songs: Vec<Song>) -> Result<usize> {
    let raws = songs
      .into_iter()
      .map(RawSong::encode)
      .collect::<Result<Vec<_>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT OR REPLACE INTO cantos ({SONG_SELECT})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ))?;
          for r in &raws {
            stmt.execute(rusqlite::params![
              r.id,
              r.titulo,
              r.autor,
              r.tono,
              r.version,
              r.cuerpo,
              r.historia,
              r.pdf,
              r.fundamento_biblico,
              r.youtube_url,
              r.mp3_urls,
              r.creado_en,
            ])?;
          }
        }
        tx.commit()?;
        Ok(raws.len())
      })
      .await?;

    debug!(rows = written, "mirror upsert committed");
    Ok(written)
  }

  async fn find_by(&self, index: MirrorIndex, value: &str) -> Result<Vec<Song>> {
    let sql = format!(
      "SELECT {SONG_SELECT} FROM cantos WHERE {} = ?1 ORDER BY titulo",
      index.as_ref()
    );
    self.query_songs(sql, vec![Value::Text(value.to_owned())]).await
  }

  async fn get_setting(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM settings WHERE key = ?1",
              rusqlite::params![key],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn put_setting(&self, key: &str, value: String) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SongCatalog impl ────────────────────────────────────────────────────────

impl SongCatalog for SqliteStore {
  type Error = Error;

  async fn list_songs(&self, query: &SongQuery) -> Result<Vec<Song>> {
    let after = query
      .created_after
      .map_or(Value::Null, |dt| Value::Text(encode_dt(dt)));
    // A negative LIMIT means "no limit" in SQLite.
    let limit = Value::Integer(query.limit.map_or(-1, |n| n as i64));

    let sql = format!(
      "SELECT {SONG_SELECT} FROM cantos
       WHERE (?1 IS NULL OR creado_en > ?1)
       ORDER BY titulo
       LIMIT ?2"
    );
    self.query_songs(sql, vec![after, limit]).await
  }

  async fn get_song(&self, id: &RecordId) -> Result<Option<Song>> {
    SongMirror::get(self, id).await
  }

  async fn search_songs(
    &self,
    term: &str,
    limit: usize,
  ) -> Result<Vec<SongSummary>> {
    let pattern = like_pattern(term);
    let limit = limit as i64;

    let raws: Vec<RawSongSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, titulo, autor, tono FROM cantos
           WHERE titulo LIKE ?1 ESCAPE '\\' OR autor LIKE ?1 ESCAPE '\\'
           ORDER BY titulo
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], |row| {
            Ok(RawSongSummary {
              id:     row.get(0)?,
              titulo: row.get(1)?,
              autor:  row.get(2)?,
              tono:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawSongSummary::into_summary).collect())
  }

  async fn search_blogs(
    &self,
    term: &str,
    limit: usize,
  ) -> Result<Vec<BlogSummary>> {
    let pattern = like_pattern(term);
    let limit = limit as i64;

    let raws: Vec<RawBlogSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, titulo, resumen FROM blogs
           WHERE titulo LIKE ?1 ESCAPE '\\' OR resumen LIKE ?1 ESCAPE '\\'
           ORDER BY titulo
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], |row| {
            Ok(RawBlogSummary {
              id:      row.get(0)?,
              titulo:  row.get(1)?,
              resumen: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawBlogSummary::into_summary).collect())
  }

  async fn list_blogs(&self) -> Result<Vec<BlogPost>> {
    let raws: Vec<RawBlog> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BLOG_SELECT} FROM blogs
           ORDER BY fecha_publicacion DESC, creado_en DESC"
        ))?;
        let rows = stmt
          .query_map([], RawBlog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBlog::into_blog).collect()
  }

  async fn get_blog(&self, id: &RecordId) -> Result<Option<BlogPost>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawBlog> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BLOG_SELECT} FROM blogs WHERE id = ?1"),
              rusqlite::params![id_str],
              RawBlog::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBlog::into_blog).transpose()
  }
}
