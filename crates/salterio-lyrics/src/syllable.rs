//! First-syllable heuristic for Spanish lyrics.
//!
//! A chord is drawn over the first syllable of the word it precedes. The
//! heuristic takes the leading run of consonants plus, if present, the vowel
//! that follows it. `qu` before a vowel is kept together as an onset, and a
//! vowel following a `ch`, `ll`, `qu` or `rr` onset absorbs a trailing `h`.

const CONSONANTS: &str = "bcdfghjklmnñpqrstvwxyz";
const VOWELS: &str = "aeiouáéíóú";
const DIGRAPHS: &[[char; 2]] = &[['c', 'h'], ['l', 'l'], ['q', 'u'], ['r', 'r']];

fn fold(c: char) -> char { c.to_lowercase().next().unwrap_or(c) }

fn is_consonant(c: char) -> bool { CONSONANTS.contains(c) }

fn is_vowel(c: char) -> bool { VOWELS.contains(c) }

/// The first syllable of `text`, or `None` if `text` doesn't start with a
/// letter from the Spanish alphabet.
pub fn first_syllable(text: &str) -> Option<&str> {
  let chars: Vec<(usize, char)> = text.char_indices().collect();
  let at = |k: usize| chars.get(k).map(|&(_, c)| fold(c));

  let mut k = 0;
  while at(k).is_some_and(is_consonant) {
    k += 1;
  }

  if k > 0
    && at(k - 1) == Some('q')
    && at(k) == Some('u')
    && at(k + 1).is_some_and(is_vowel)
  {
    k += 1;
  }

  if at(k).is_some_and(is_vowel) {
    let after_digraph = k >= 2
      && DIGRAPHS
        .iter()
        .any(|[a, b]| at(k - 2) == Some(*a) && at(k - 1) == Some(*b));
    k += 1;
    if after_digraph && at(k) == Some('h') {
      k += 1;
    }
  }

  if k == 0 {
    return None;
  }
  let end = chars.get(k).map_or(text.len(), |&(i, _)| i);
  Some(&text[..end])
}
