//! SQL schema for the Salterio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Mirror of the remote `cantos` relation. Rows are overwritten by id and
-- never deleted.
CREATE TABLE IF NOT EXISTS cantos (
    id                 TEXT PRIMARY KEY,
    titulo             TEXT NOT NULL DEFAULT '',
    autor              TEXT,
    tono               TEXT,
    version            TEXT,
    cuerpo             TEXT,
    historia           TEXT,
    pdf                TEXT,
    fundamento_biblico TEXT,
    youtube_url        TEXT,
    mp3_urls           TEXT NOT NULL DEFAULT '[]',  -- JSON array
    creado_en          TEXT                         -- RFC 3339 UTC, fixed width
);

CREATE INDEX IF NOT EXISTS cantos_titulo_idx  ON cantos(titulo);
CREATE INDEX IF NOT EXISTS cantos_tono_idx    ON cantos(tono);
CREATE INDEX IF NOT EXISTS cantos_autor_idx   ON cantos(autor);
CREATE INDEX IF NOT EXISTS cantos_version_idx ON cantos(version);

CREATE TABLE IF NOT EXISTS blogs (
    id                TEXT PRIMARY KEY,
    titulo            TEXT NOT NULL DEFAULT '',
    resumen           TEXT,
    contenido         TEXT,
    fecha_publicacion TEXT,
    cover_img         TEXT,
    podcast_url       TEXT,
    video_url         TEXT,
    creado_en         TEXT
);

-- Durable client key-value settings (sync watermark, preferences).
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

PRAGMA user_version = 1;
";
