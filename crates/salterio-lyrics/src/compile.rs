//! Annotated-lyrics → HTML compiler.
//!
//! Pipeline:
//!   raw &str
//!     └─ wrap_paragraphs()        → one `<p>` per line, headers left bare
//!          └─ replace_headers()       → `[Label:]` → `<b class="titulo">`
//!               └─ replace_double_chords() → `{{Am}}` → `<b class="note-single">`
//!                    └─ replace_chords()        → `{Am}la` → `<nota>`
//!
//! Every stage is total: anything it doesn't recognise is copied through
//! verbatim. The output is trusted HTML; lyric text is not escaped.

use crate::{
  chord::{doubled_at, is_chord_name, single_at},
  syllable::first_syllable,
};

pub const PARAGRAPH_CLASS: &str = "verso lh-lg text-wrap fs-6";
pub const HEADER_CLASS: &str = "titulo";
pub const SINGLE_NOTE_CLASS: &str = "note-single";
pub const NOTE_CLASS: &str = "note";
/// Class of the hidden span that gives a floating chord the width of its
/// label.
pub const SPACER_CLASS: &str = "invisible";

/// Compile an annotated song body into HTML.
pub fn compile(body: &str) -> String {
  if body.is_empty() {
    return String::new();
  }
  let html = wrap_paragraphs(body);
  let html = replace_headers(&html);
  let html = replace_double_chords(&html);
  replace_chords(&html)
}

// ─── Headers ─────────────────────────────────────────────────────────────────

/// A `[Label:]` span. Offsets are byte positions.
struct Header<'a> {
  start: usize,
  end:   usize,
  label: &'a str,
}

/// Find the first `[Label:]` at or after `from`. The label is the shortest
/// run of characters up to `:]` and never crosses a line break.
fn find_header(s: &str, from: usize) -> Option<Header<'_>> {
  let mut cursor = from;
  while let Some(offset) = s[cursor..].find('[') {
    let open = cursor + offset;
    let line = &s[open + 1..];
    let line = line.find('\n').map_or(line, |nl| &line[..nl]);
    if let Some(close) = line.find(":]") {
      return Some(Header {
        start: open,
        end:   open + 1 + close + 2,
        label: &line[..close],
      });
    }
    cursor = open + 1;
  }
  None
}

fn is_header_line(line: &str) -> bool {
  find_header(line, 0).is_some_and(|h| h.start == 0)
}

// ─── Stages ──────────────────────────────────────────────────────────────────

/// Wrap every line in a paragraph, except lines that open with a section
/// header. A trailing `\r` is dropped from each line.
pub fn wrap_paragraphs(text: &str) -> String {
  text
    .split('\n')
    .map(|line| {
      let line = line.strip_suffix('\r').unwrap_or(line);
      if is_header_line(line) {
        line.to_owned()
      } else {
        format!("<p class=\"{PARAGRAPH_CLASS}\">{line}</p>")
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Replace each `[Label:]` with a bold header. `[Label]` without the colon
/// is left alone.
pub fn replace_headers(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut copied = 0;

  while let Some(header) = find_header(text, copied) {
    out.push_str(&text[copied..header.start]);
    out.push_str(&format!(
      "<b class=\"{HEADER_CLASS}\">{}:</b>",
      header.label
    ));
    copied = header.end;
  }

  out.push_str(&text[copied..]);
  out
}

/// Replace each `{{Chord}}` with a standalone bold note.
pub fn replace_double_chords(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut copied = 0;
  let mut cursor = 0;

  while let Some(offset) = text[cursor..].find("{{") {
    let start = cursor + offset;
    match doubled_at(text, start).filter(|t| is_chord_name(t.inner)) {
      Some(token) => {
        out.push_str(&text[copied..start]);
        out.push_str(&format!(
          "<b class=\"{SINGLE_NOTE_CLASS}\">{}</b>",
          token.inner
        ));
        copied = token.end;
        cursor = token.end;
      }
      None => cursor = start + 1,
    }
  }

  out.push_str(&text[copied..]);
  out
}

/// Attach each `{Chord}` to the first syllable of the text that follows it.
///
/// The following text runs up to the next whitespace or `{`. When it has no
/// syllable the chord floats over a non-breaking space, padded by a hidden
/// copy of its label. Adjacent tokens are resolved in the same pass.
pub fn replace_chords(text: &str) -> String {
  let mut out = String::with_capacity(text.len() * 2);
  let mut copied = 0;
  let mut cursor = 0;

  while let Some(offset) = text[cursor..].find('{') {
    let start = cursor + offset;
    let Some(token) = single_at(text, start).filter(|t| is_chord_name(t.inner))
    else {
      cursor = start + 1;
      continue;
    };

    let rest = &text[token.end..];
    let follow_len = rest
      .find(|c: char| c.is_whitespace() || c == '{')
      .unwrap_or(rest.len());
    let following = &rest[..follow_len];

    out.push_str(&text[copied..start]);
    match first_syllable(following) {
      Some(syllable) => {
        out.push_str(&format!(
          "<nota class=\"{NOTE_CLASS}\" data-content=\"{chord}\">{syllable}</nota>",
          chord = token.inner,
        ));
        out.push_str(&following[syllable.len()..]);
      }
      None => {
        out.push_str(&format!(
          "<nota class=\"{NOTE_CLASS}\" data-content=\"{chord}\">&nbsp;<span class=\"{SPACER_CLASS}\">{chord}</span></nota>",
          chord = token.inner,
        ));
        out.push_str(following);
      }
    }

    copied = token.end + follow_len;
    cursor = copied;
  }

  out.push_str(&text[copied..]);
  out
}
