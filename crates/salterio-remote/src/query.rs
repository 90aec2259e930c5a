//! PostgREST query-string builders.
//!
//! Each function returns the `(key, value)` pairs for one request; the client
//! hands them to [`reqwest::RequestBuilder::query`], which does the
//! percent-encoding.

use std::borrow::Cow;

use salterio_core::{RecordId, record::format_timestamp, store::SongQuery};

/// Song relation name.
pub const SONGS: &str = "cantos";
/// Blog relation name.
pub const BLOGS: &str = "blogs";

pub type Params = Vec<(&'static str, String)>;

/// Characters PostgREST reserves inside filter values.
const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\', ' '];

/// Quote a filter value if it contains reserved characters.
pub fn quote(value: &str) -> Cow<'_, str> {
  if !value.contains(RESERVED) {
    return Cow::Borrowed(value);
  }
  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  for c in value.chars() {
    if matches!(c, '"' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('"');
  Cow::Owned(out)
}

fn select(columns: &[&str]) -> (&'static str, String) {
  ("select", columns.join(","))
}

/// `select=…&order=titulo.asc[&creado_en=gt.<ts>][&limit=n]`
pub fn list_songs(columns: &[&str], query: &SongQuery) -> Params {
  let mut params = vec![select(columns), ("order", "titulo.asc".to_owned())];
  if let Some(after) = query.created_after {
    params.push(("creado_en", format!("gt.{}", format_timestamp(after))));
  }
  if let Some(limit) = query.limit {
    params.push(("limit", limit.to_string()));
  }
  params
}

/// `select=…&order=fecha_publicacion.desc`
pub fn list_blogs(columns: &[&str]) -> Params {
  vec![select(columns), ("order", "fecha_publicacion.desc".to_owned())]
}

/// `select=…&id=eq.<id>&limit=1`
pub fn by_id(columns: &[&str], id: &RecordId) -> Params {
  vec![
    select(columns),
    ("id", format!("eq.{}", quote(id.as_str()))),
    ("limit", "1".to_owned()),
  ]
}

/// `select=…&or=(a.ilike.*term*,b.ilike.*term*)&limit=n`
pub fn search(
  columns: &[&str],
  fields: &[&str],
  term: &str,
  limit: usize,
) -> Params {
  vec![
    select(columns),
    ("or", ilike_any(fields, term)),
    ("limit", limit.to_string()),
  ]
}

/// A disjunction of case-insensitive substring matches of `term` over
/// `fields`.
pub fn ilike_any(fields: &[&str], term: &str) -> String {
  let pattern = format!("*{term}*");
  let pattern = quote(&pattern);
  let clauses: Vec<String> = fields
    .iter()
    .map(|field| format!("{field}.ilike.{pattern}"))
    .collect();
  format!("({})", clauses.join(","))
}
