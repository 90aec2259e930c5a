//! Identifiers and column helpers shared by every record type.
//!
//! The remote data service is loosely typed: ids may arrive as JSON numbers
//! or strings, nullable text columns arrive as `null`, and timestamp columns
//! may or may not carry an offset. The helpers here normalise all of that at
//! the deserialisation boundary so the rest of the workspace works with plain
//! Rust types.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ─── RecordId ────────────────────────────────────────────────────────────────

/// Stable identifier of a song or blog post.
///
/// Always serialised as a string; deserialised from either a string or an
/// integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<i64> for RecordId {
  fn from(n: i64) -> Self { Self(n.to_string()) }
}

impl Serialize for RecordId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for RecordId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Text(String),
      Int(i64),
      Uint(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
      Raw::Text(s) => Self(s),
      Raw::Int(n) => Self(n.to_string()),
      Raw::Uint(n) => Self(n.to_string()),
    })
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Parse a timestamp as written by the data service.
///
/// Accepts RFC 3339, the Postgres text form (`2024-01-05 10:00:00+00`) and
/// offset-less ISO-8601, which is read as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
    return Ok(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Ok(naive.and_utc());
    }
  }
  Err(Error::InvalidTimestamp(s.to_owned()))
}

/// Canonical text form used for watermarks and SQLite columns.
pub fn format_timestamp(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// serde adapter for `Option<DateTime<Utc>>` columns using
/// [`parse_timestamp`].
pub mod optional_timestamp {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(dt) => serializer.serialize_str(&super::format_timestamp(*dt)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
      .filter(|s| !s.trim().is_empty())
      .map(|s| super::parse_timestamp(&s).map_err(D::Error::custom))
      .transpose()
  }
}

/// Deserialise `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
