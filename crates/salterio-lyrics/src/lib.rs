//! Chord transposition and lyrics compilation for Salterio.
//!
//! Song bodies are plain text annotated with `[Label:]` section headers and
//! `{Chord}` / `{{Chord}}` tokens. This crate shifts chord roots by a number
//! of semitones and compiles the annotated text into the HTML the
//! presentation layer injects verbatim. Pure and synchronous; no I/O.
//!
//! # Quick start
//!
//! ```
//! use salterio_lyrics::{compile, transpose};
//!
//! let body = "{C}Santo";
//! let html = compile(&transpose(body, 2));
//! assert!(html.contains(r#"data-content="D">Sa</nota>"#));
//! ```

mod chord;
mod compile;
mod syllable;
mod transpose;

use salterio_core::{RecordId, song::Song};
use serde::Serialize;

pub use chord::{is_chord_name, split_root};
pub use compile::{
  compile, replace_chords, replace_double_chords, replace_headers,
  wrap_paragraphs,
};
pub use syllable::first_syllable;
pub use transpose::{NOTES, transpose, transpose_chord, transpose_root};

/// Transpose `body` by `delta` semitones and compile it.
pub fn render(body: &str, delta: i32) -> String {
  compile(&transpose(body, delta))
}

/// A song prepared for display in a given key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSong {
  pub id:     RecordId,
  pub titulo: String,
  /// The home key moved by the same delta as the chords. Keys that are not
  /// chord names (`"Do mayor"`) are kept verbatim.
  pub tono:   Option<String>,
  pub delta:  i32,
  pub html:   String,
}

/// Render `song`'s body and key shifted by `delta` semitones.
pub fn render_song(song: &Song, delta: i32) -> RenderedSong {
  RenderedSong {
    id: song.id.clone(),
    titulo: song.titulo.clone(),
    tono: song.tono.as_deref().map(|t| {
      if is_chord_name(t) {
        transpose_chord(t, delta)
      } else {
        t.to_owned()
      }
    }),
    delta,
    html: render(song.body(), delta),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_transposes_before_compiling() {
    assert_eq!(render("{{Am}}", 3), compile("{{Cm}}"));
  }

  #[test]
  fn render_song_moves_the_key() {
    let mut song = Song::new("1", "Gloria");
    song.tono = Some("G".into());
    song.cuerpo = Some("{G}Gloria".into());

    let rendered = render_song(&song, 2);
    assert_eq!(rendered.tono.as_deref(), Some("A"));
    assert!(rendered.html.contains(r#"data-content="A">Glo</nota>ria"#));
  }

  #[test]
  fn render_song_keeps_keys_that_are_not_chord_names() {
    let mut song = Song::new("3", "Pescador de hombres");
    song.tono = Some("Do mayor".into());
    assert_eq!(render_song(&song, 3).tono.as_deref(), Some("Do mayor"));

    song.tono = Some("Em".into());
    assert_eq!(render_song(&song, 3).tono.as_deref(), Some("Gm"));
  }

  #[test]
  fn render_song_without_body_is_empty() {
    let rendered = render_song(&Song::new("2", "Sin letra"), 5);
    assert_eq!(rendered.html, "");
    assert_eq!(rendered.tono, None);
  }
}
