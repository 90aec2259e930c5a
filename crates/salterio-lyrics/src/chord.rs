//! Chord-name grammar and brace-token scanning shared by the transposer and
//! the compiler.
//!
//! Two grammars are in play:
//!
//! * the **root split** used for transposition: a root `A`–`G` with an
//!   optional `#` or `b`, followed by an arbitrary suffix;
//! * the **chord name** accepted by the compiler:
//!   `[A-G](b|#)?(m|sus|maj|add)?[0-9]*(/[A-G](b|#)?)?`.

// ─── Grammar ─────────────────────────────────────────────────────────────────

const QUALITIES: &[&str] = &["maj", "sus", "add", "m"];

/// Consume a note letter and optional accidental at the start of `s`.
/// Returns the byte length consumed, or `None` if `s` doesn't start with a
/// note letter.
fn note_len(s: &str) -> Option<usize> {
  let bytes = s.as_bytes();
  match bytes.first() {
    Some(b'A'..=b'G') => {}
    _ => return None,
  }
  Some(if matches!(bytes.get(1), Some(b'#' | b'b')) { 2 } else { 1 })
}

/// Split a chord into its root (`"C#"`, `"Bb"`, `"G"`) and the verbatim
/// remainder. Returns `None` if the chord doesn't start with a note letter.
pub fn split_root(chord: &str) -> Option<(&str, &str)> {
  note_len(chord).map(|n| chord.split_at(n))
}

/// Whether `name` is a complete chord name, optionally with a slash bass.
pub fn is_chord_name(name: &str) -> bool {
  let Some(mut pos) = note_len(name) else {
    return false;
  };

  if let Some(q) = QUALITIES.iter().find(|q| name[pos..].starts_with(**q)) {
    pos += q.len();
  }

  pos += name[pos..].bytes().take_while(u8::is_ascii_digit).count();

  if let Some(bass) = name[pos..].strip_prefix('/') {
    return note_len(bass) == Some(bass.len());
  }

  pos == name.len()
}

// ─── Token scanning ──────────────────────────────────────────────────────────

/// A brace-delimited token located in a larger string. Offsets are byte
/// positions; `inner` excludes the braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
  pub start: usize,
  pub end:   usize,
  pub inner: &'a str,
}

/// Match `{{inner}}` at `start`: `inner` is one or more characters other than
/// `}`, followed immediately by `}}`.
pub(crate) fn doubled_at(s: &str, start: usize) -> Option<Token<'_>> {
  let rest = s[start..].strip_prefix("{{")?;
  let close = rest.find('}')?;
  if close == 0 || !rest[close..].starts_with("}}") {
    return None;
  }
  Some(Token {
    start,
    end: start + 2 + close + 2,
    inner: &rest[..close],
  })
}

/// Match `{inner}` at `start` where `inner` is one or more characters other
/// than braces.
pub(crate) fn single_at(s: &str, start: usize) -> Option<Token<'_>> {
  let rest = s[start..].strip_prefix('{')?;
  let close = rest.find(['{', '}'])?;
  if close == 0 || !rest[close..].starts_with('}') {
    return None;
  }
  Some(Token {
    start,
    end: start + 1 + close + 1,
    inner: &rest[..close],
  })
}

/// A single token that is not part of a doubled pair: not preceded by `{` and
/// not followed by a second `}`.
pub(crate) fn lone_single_at(s: &str, start: usize) -> Option<Token<'_>> {
  if s[..start].ends_with('{') {
    return None;
  }
  single_at(s, start).filter(|t| !s[t.end..].starts_with('}'))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_common_chords() {
    for name in [
      "C", "Am", "F#m", "Bb", "Ebmaj7", "Gsus4", "Cadd9", "A7", "D/F#", "Am7/G",
      "Dbm/Ab",
    ] {
      assert!(is_chord_name(name), "{name} should be a chord");
    }
  }

  #[test]
  fn rejects_non_chords() {
    for name in ["", "H", "am", "Bm7b5", "C7sus4", "D/", "D/H", "Coro", "G "] {
      assert!(!is_chord_name(name), "{name:?} should not be a chord");
    }
  }

  #[test]
  fn root_split() {
    assert_eq!(split_root("Bbm7"), Some(("Bb", "m7")));
    assert_eq!(split_root("C#"), Some(("C#", "")));
    assert_eq!(split_root("D/F#"), Some(("D", "/F#")));
    assert_eq!(split_root("x"), None);
  }

  #[test]
  fn doubled_and_single_tokens() {
    let s = "a{{Am}}b{C}";
    let d = doubled_at(s, 1).unwrap();
    assert_eq!((d.inner, &s[d.end..]), ("Am", "b{C}"));
    assert!(lone_single_at(s, 2).is_none());
    let t = lone_single_at(s, 8).unwrap();
    assert_eq!((t.inner, t.end), ("C", s.len()));
  }

  #[test]
  fn unterminated_tokens_do_not_match() {
    assert!(single_at("{Am", 0).is_none());
    assert!(single_at("{}", 0).is_none());
    assert!(doubled_at("{{Am}x", 0).is_none());
  }
}
