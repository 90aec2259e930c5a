//! Strong ETags for JSON snapshots and `If-None-Match` evaluation.

use sha2::{Digest, Sha256};

/// Quoted hex SHA-256 of `body`.
pub fn compute_etag(body: &[u8]) -> String {
  let hash = Sha256::digest(body);
  format!("\"{}\"", hex::encode(hash))
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*`, comma-separated lists, weak validators (`W/"…"`) and
/// unquoted tags; comparison is weak, as RFC 9110 requires for this header.
pub fn if_none_match(header: &str, etag: &str) -> bool {
  let etag = strip(etag);
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || strip(candidate) == etag
  })
}

fn strip(tag: &str) -> &str {
  let tag = tag.strip_prefix("W/").unwrap_or(tag);
  tag.trim_matches('"')
}
