//! Picks the best available record for a song and keeps refining it.
//!
//! A view starts from whatever the caller already has (a record rendered by
//! the server, or nothing) and upgrades it as better sources answer: the
//! site's static snapshot, then the local mirror, including rows the sync
//! agent writes while the view is open. Upgrades are ordered by
//! [`Provenance::rank`] and a view never moves to a lower-ranked source.

use std::sync::Arc;

use salterio_core::{RecordId, song::Song, store::SongMirror};
use strum::Display;
use tokio::{
  sync::{broadcast, watch},
  task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
  snapshot::{self, SnapshotSource},
  sync::{MirrorEvent, MirrorEvents},
};

/// Where the record currently shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Provenance {
  Placeholder,
  Server,
  Snapshot,
  Mirror,
}

impl Provenance {
  pub fn rank(self) -> u8 {
    match self {
      Self::Placeholder => 0,
      Self::Server | Self::Snapshot => 1,
      Self::Mirror => 2,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
  pub song:       Song,
  pub provenance: Provenance,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct SongResolver<S, M> {
  snapshot: Arc<S>,
  mirror:   Option<(Arc<M>, MirrorEvents)>,
}

impl<S, M> SongResolver<S, M>
where
  S: SnapshotSource + 'static,
  M: SongMirror + 'static,
{
  /// A resolver that never consults a local mirror.
  pub fn new(snapshot: Arc<S>) -> Self { Self { snapshot, mirror: None } }

  /// Let mirror rows supersede server and snapshot records. `events` must be
  /// the feed the sync agent publishes on.
  pub fn with_mirror(mut self, mirror: Arc<M>, events: MirrorEvents) -> Self {
    self.mirror = Some((mirror, events));
    self
  }

  /// Open a view of song `id`. Must be called inside a tokio runtime.
  pub fn open(&self, id: RecordId, server: Option<Song>) -> SongView {
    let initial = match server {
      Some(song) if song.has_body() => {
        Resolved { song, provenance: Provenance::Server }
      }
      _ => Resolved {
        song:       Song::placeholder(id.clone()),
        provenance: Provenance::Placeholder,
      },
    };
    let (tx, rx) = watch::channel(initial);

    // Subscribe before the first mirror read so no write can slip between.
    let mirror = self
      .mirror
      .as_ref()
      .map(|(store, events)| (store.clone(), events.subscribe()));
    let snapshot = self.snapshot.clone();

    let task = tokio::spawn(refine(id, snapshot, mirror, tx));
    SongView { rx, task }
  }
}

/// Replace the current record if `provenance` ranks at least as high.
fn offer(tx: &watch::Sender<Resolved>, song: Song, provenance: Provenance) {
  tx.send_if_modified(|current| {
    if provenance.rank() < current.provenance.rank() {
      return false;
    }
    *current = Resolved { song, provenance };
    true
  });
}

async fn read_mirror<M: SongMirror>(
  store: &M,
  id: &RecordId,
  tx: &watch::Sender<Resolved>,
) {
  match store.get(id).await {
    Ok(Some(song)) => offer(tx, song, Provenance::Mirror),
    Ok(None) => {}
    Err(e) => warn!(%id, error = %e, "mirror read failed"),
  }
}

async fn refine<S, M>(
  id: RecordId,
  snapshot: Arc<S>,
  mirror: Option<(Arc<M>, broadcast::Receiver<MirrorEvent>)>,
  tx: watch::Sender<Resolved>,
) where
  S: SnapshotSource,
  M: SongMirror,
{
  if let Some((store, _)) = &mirror {
    read_mirror(store.as_ref(), &id, &tx).await;
  }

  let rank = tx.borrow().provenance.rank();
  if rank < Provenance::Snapshot.rank() {
    match snapshot.fetch().await {
      Ok(songs) => match snapshot::find(songs, &id) {
        Some(song) => offer(&tx, song, Provenance::Snapshot),
        None => debug!(%id, "song missing from snapshot"),
      },
      Err(e) => warn!(%id, error = %e, "snapshot fetch failed"),
    }
  }

  let Some((store, mut events)) = mirror else { return };
  loop {
    match events.recv().await {
      Ok(MirrorEvent::Upserted(ids)) if ids.contains(&id) => {
        read_mirror(store.as_ref(), &id, &tx).await;
      }
      Ok(_) => {}
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        debug!(%id, skipped, "mirror feed lagged, re-reading");
        read_mirror(store.as_ref(), &id, &tx).await;
      }
      Err(broadcast::error::RecvError::Closed) => return,
    }
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// A live handle on one song. Dropping it stops refinement.
pub struct SongView {
  rx:   watch::Receiver<Resolved>,
  task: JoinHandle<()>,
}

impl SongView {
  pub fn current(&self) -> Resolved { self.rx.borrow().clone() }

  /// Wait for the next refinement. `None` once no further refinement can
  /// arrive.
  pub async fn changed(&mut self) -> Option<Resolved> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }

  pub fn close(self) {}
}

impl Drop for SongView {
  fn drop(&mut self) { self.task.abort(); }
}
