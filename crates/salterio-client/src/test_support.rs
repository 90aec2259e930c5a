//! In-process stand-ins for the remote catalog and the mirror.
//!
//! Neither ever yields to another thread, so they are safe under a paused
//! tokio clock.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use salterio_core::{
  RecordId,
  blog::{BlogPost, BlogSummary},
  song::{Song, SongSummary},
  store::{MirrorIndex, SongCatalog, SongMirror, SongQuery},
};

#[derive(Debug, thiserror::Error)]
#[error("service unavailable")]
pub struct Unavailable;

/// A remote catalog that records every listing query and can be told to fail.
#[derive(Default)]
pub struct FakeRemote {
  pub songs:   Mutex<Vec<Song>>,
  pub queries: Mutex<Vec<SongQuery>>,
  pub failing: AtomicBool,
}

impl FakeRemote {
  pub fn with(songs: Vec<Song>) -> Self {
    Self { songs: Mutex::new(songs), ..Self::default() }
  }

  pub fn calls(&self) -> usize { self.queries.lock().unwrap().len() }

  pub fn last_query(&self) -> SongQuery {
    self.queries.lock().unwrap().last().cloned().unwrap()
  }

  pub fn fail(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }
}

impl SongCatalog for FakeRemote {
  type Error = Unavailable;

  async fn list_songs(&self, query: &SongQuery) -> Result<Vec<Song>, Unavailable> {
    self.queries.lock().unwrap().push(query.clone());
    if self.failing.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    let songs = self.songs.lock().unwrap().clone();
    Ok(
      songs
        .into_iter()
        .filter(|s| match (query.created_after, s.creado_en) {
          (Some(after), Some(at)) => at > after,
          (Some(_), None) => false,
          (None, _) => true,
        })
        .collect(),
    )
  }

  async fn get_song(&self, id: &RecordId) -> Result<Option<Song>, Unavailable> {
    Ok(self.songs.lock().unwrap().iter().find(|s| &s.id == id).cloned())
  }

  async fn search_songs(
    &self,
    _: &str,
    _: usize,
  ) -> Result<Vec<SongSummary>, Unavailable> {
    Ok(vec![])
  }

  async fn search_blogs(
    &self,
    _: &str,
    _: usize,
  ) -> Result<Vec<BlogSummary>, Unavailable> {
    Ok(vec![])
  }

  async fn list_blogs(&self) -> Result<Vec<BlogPost>, Unavailable> {
    Ok(vec![])
  }

  async fn get_blog(&self, _: &RecordId) -> Result<Option<BlogPost>, Unavailable> {
    Ok(None)
  }
}

/// A mirror held in memory. Song reads fail while `failing_reads` is set.
#[derive(Default)]
pub struct MemoryMirror {
  songs:             Mutex<BTreeMap<RecordId, Song>>,
  settings:          Mutex<BTreeMap<String, String>>,
  pub failing_reads: AtomicBool,
}

impl SongMirror for MemoryMirror {
  type Error = Unavailable;

  async fn count(&self) -> Result<u64, Unavailable> {
    Ok(self.songs.lock().unwrap().len() as u64)
  }

  async fn get(&self, id: &RecordId) -> Result<Option<Song>, Unavailable> {
    if self.failing_reads.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    Ok(self.songs.lock().unwrap().get(id).cloned())
  }

  async fn upsert_songs(&self, songs: Vec<Song>) -> Result<usize, Unavailable> {
    let mut map = self.songs.lock().unwrap();
    let n = songs.len();
    for song in songs {
      map.insert(song.id.clone(), song);
    }
    Ok(n)
  }

  async fn find_by(
    &self,
    index: MirrorIndex,
    value: &str,
  ) -> Result<Vec<Song>, Unavailable> {
    let map = self.songs.lock().unwrap();
    Ok(
      map
        .values()
        .filter(|s| {
          let field = match index {
            MirrorIndex::Titulo => Some(s.titulo.as_str()),
            MirrorIndex::Tono => s.tono.as_deref(),
            MirrorIndex::Autor => s.autor.as_deref(),
            MirrorIndex::Version => s.version.as_deref(),
          };
          field == Some(value)
        })
        .cloned()
        .collect(),
    )
  }

  async fn get_setting(&self, key: &str) -> Result<Option<String>, Unavailable> {
    Ok(self.settings.lock().unwrap().get(key).cloned())
  }

  async fn put_setting(&self, key: &str, value: String) -> Result<(), Unavailable> {
    self.settings.lock().unwrap().insert(key.to_owned(), value);
    Ok(())
  }
}
