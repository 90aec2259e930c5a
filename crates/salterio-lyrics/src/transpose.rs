//! Semitone transposition of chord tokens in a raw song body.
//!
//! Only chord roots move. Flats are read through their sharp enharmonic and
//! every transposed root is written sharp-spelled. Slash-bass notes are kept
//! verbatim: `{D/F#}` up one semitone is `{D#/F#}`.

use std::borrow::Cow;

use crate::chord::{doubled_at, lone_single_at, split_root};

/// The chromatic scale, sharp-spelled, starting at C.
pub const NOTES: [&str; 12] =
  ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

fn sharp_spelling(root: &str) -> &str {
  match root {
    "Db" => "C#",
    "Eb" => "D#",
    "Gb" => "F#",
    "Ab" => "G#",
    "Bb" => "A#",
    other => other,
  }
}

/// Move `root` by `delta` semitones. Returns `None` for roots outside the
/// table (e.g. `Cb`, `E#`).
pub fn transpose_root(root: &str, delta: i32) -> Option<&'static str> {
  let sharp = sharp_spelling(root);
  let idx = NOTES.iter().position(|n| *n == sharp)?;
  let shifted = (idx as i32 + delta.rem_euclid(12)) % 12;
  Some(NOTES[shifted as usize])
}

/// Transpose one chord name. Anything that doesn't start with a known root is
/// returned unchanged.
pub fn transpose_chord(chord: &str, delta: i32) -> String {
  split_root(chord)
    .and_then(|(root, suffix)| {
      transpose_root(root, delta).map(|r| format!("{r}{suffix}"))
    })
    .unwrap_or_else(|| chord.to_owned())
}

/// Transpose every `{Chord}` and `{{Chord}}` token in `body` by `delta`
/// semitones.
///
/// With `delta == 0` the input slice itself is returned.
pub fn transpose(body: &str, delta: i32) -> Cow<'_, str> {
  if delta == 0 {
    return Cow::Borrowed(body);
  }

  let mut out = String::with_capacity(body.len() + 16);
  let mut copied = 0;
  let mut cursor = 0;

  while let Some(offset) = body[cursor..].find('{') {
    let start = cursor + offset;

    if let Some(token) = doubled_at(body, start) {
      out.push_str(&body[copied..start]);
      out.push_str("{{");
      out.push_str(&transpose_chord(token.inner, delta));
      out.push_str("}}");
      copied = token.end;
      cursor = token.end;
    } else if let Some(token) = lone_single_at(body, start) {
      out.push_str(&body[copied..start]);
      out.push('{');
      out.push_str(&transpose_chord(token.inner, delta));
      out.push('}');
      copied = token.end;
      cursor = token.end;
    } else {
      cursor = start + 1;
    }
  }

  out.push_str(&body[copied..]);
  Cow::Owned(out)
}
