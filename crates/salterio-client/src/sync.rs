//! Background sync agent.
//!
//! One cycle pulls every song created or modified after the stored watermark
//! from the remote catalog, overwrites the mirror rows by id, announces the
//! written ids to live subscribers and advances the watermark. A failed cycle
//! leaves the watermark where it was so the same rows are fetched again next
//! time (at-least-once). Deletions are never propagated.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use salterio_core::{
  RecordId,
  record::{format_timestamp, parse_timestamp},
  store::{LAST_SYNC_KEY, SongCatalog, SongMirror, SongQuery},
};
use strum::{AsRefStr, Display};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result,
  context::{RuntimeContext, SyncPolicy},
};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
  #[default]
  Idle,
  Syncing,
  Error,
}

/// Observable agent state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
  pub status:    SyncStatus,
  /// Watermark written by the last successful cycle in this process.
  pub last_sync: Option<DateTime<Utc>>,
}

/// What a call to [`SyncAgent::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The sync policy excludes this client; nothing was touched.
  Disabled,
  /// Another cycle was in flight.
  AlreadyRunning,
  Synced { rows: usize },
}

// ─── Mirror events ───────────────────────────────────────────────────────────

/// A change written to the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
  Upserted(Vec<RecordId>),
}

/// Live feed of [`MirrorEvent`]s. Cloning shares the feed.
#[derive(Debug, Clone)]
pub struct MirrorEvents {
  tx: broadcast::Sender<MirrorEvent>,
}

impl MirrorEvents {
  const CAPACITY: usize = 64;

  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(Self::CAPACITY);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
    self.tx.subscribe()
  }

  /// Announce an event. Having no subscribers is not an error.
  pub fn publish(&self, event: MirrorEvent) {
    let _ = self.tx.send(event);
  }
}

impl Default for MirrorEvents {
  fn default() -> Self { Self::new() }
}

// ─── Agent ───────────────────────────────────────────────────────────────────

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Keeps a [`SongMirror`] up to date with a remote [`SongCatalog`].
pub struct SyncAgent<R, M> {
  remote:  Arc<R>,
  mirror:  Arc<M>,
  policy:  SyncPolicy,
  context: RuntimeContext,
  clock:   Clock,
  running: AtomicBool,
  state:   watch::Sender<SyncState>,
  events:  MirrorEvents,
}

/// Clears the in-flight flag when a cycle ends, including by cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

impl<R, M> SyncAgent<R, M>
where
  R: SongCatalog,
  M: SongMirror,
{
  pub fn new(
    remote: Arc<R>,
    mirror: Arc<M>,
    policy: SyncPolicy,
    context: RuntimeContext,
  ) -> Self {
    Self {
      remote,
      mirror,
      policy,
      context,
      clock: Arc::new(Utc::now),
      running: AtomicBool::new(false),
      state: watch::Sender::new(SyncState::default()),
      events: MirrorEvents::new(),
    }
  }

  /// Replace the wall clock used to stamp watermarks.
  pub fn with_clock(
    mut self,
    clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
  ) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  /// Publish mirror writes on `events` instead of a private feed.
  pub fn with_events(mut self, events: MirrorEvents) -> Self {
    self.events = events;
    self
  }

  pub fn is_enabled(&self) -> bool { self.policy.allows(self.context) }

  pub fn subscribe(&self) -> watch::Receiver<SyncState> {
    self.state.subscribe()
  }

  pub fn state(&self) -> SyncState { self.state.borrow().clone() }

  pub fn events(&self) -> MirrorEvents { self.events.clone() }

  /// The persisted watermark. An unreadable value is treated as absent.
  pub async fn watermark(&self) -> Result<Option<DateTime<Utc>>> {
    let raw = self
      .mirror
      .get_setting(LAST_SYNC_KEY)
      .await
      .map_err(Error::mirror)?;

    Ok(raw.and_then(|s| match parse_timestamp(&s) {
      Ok(dt) => Some(dt),
      Err(e) => {
        warn!(value = %s, error = %e, "ignoring unreadable sync watermark");
        None
      }
    }))
  }

  /// Run one sync cycle.
  pub async fn run_cycle(&self) -> Result<SyncOutcome> {
    if !self.is_enabled() {
      debug!(policy = %self.policy, "sync disabled for this client");
      return Ok(SyncOutcome::Disabled);
    }
    if self.running.swap(true, Ordering::AcqRel) {
      debug!("sync cycle already in flight");
      return Ok(SyncOutcome::AlreadyRunning);
    }
    let _in_flight = InFlight(&self.running);

    self.state.send_modify(|s| s.status = SyncStatus::Syncing);

    match self.pull().await {
      Ok((rows, watermark)) => {
        info!(rows, watermark = %format_timestamp(watermark), "sync cycle complete");
        self.state.send_modify(|s| {
          s.status = SyncStatus::Idle;
          s.last_sync = Some(watermark);
        });
        Ok(SyncOutcome::Synced { rows })
      }
      Err(e) => {
        error!(error = %e, "sync cycle failed");
        self.state.send_modify(|s| s.status = SyncStatus::Error);
        Err(e)
      }
    }
  }

  async fn pull(&self) -> Result<(usize, DateTime<Utc>)> {
    let count = self.mirror.count().await.map_err(Error::mirror)?;
    let previous = self.watermark().await?;
    // An empty mirror always gets a full pull, whatever the stored watermark.
    let since = if count == 0 { None } else { previous };
    debug!(count, since = ?since, "pulling songs");

    let songs = self
      .remote
      .list_songs(&SongQuery::since(since))
      .await
      .map_err(Error::remote)?;

    let rows = songs.len();
    if rows > 0 {
      let ids: Vec<RecordId> = songs.iter().map(|s| s.id.clone()).collect();
      self
        .mirror
        .upsert_songs(songs)
        .await
        .map_err(Error::mirror)?;
      self.events.publish(MirrorEvent::Upserted(ids));
    }

    let now = (self.clock)();
    let watermark = previous.map_or(now, |p| p.max(now));
    self
      .mirror
      .put_setting(LAST_SYNC_KEY, format_timestamp(watermark))
      .await
      .map_err(Error::mirror)?;

    Ok((rows, watermark))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::TimeZone;
  use salterio_core::song::Song;
  use salterio_store_sqlite::SqliteStore;

  use super::*;
  use crate::test_support::FakeRemote;

  fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
  }

  fn song(id: &str, hour: u32) -> Song {
    let mut s = Song::new(id, format!("Canto {id}"));
    s.creado_en = Some(at(hour));
    s
  }

  /// A clock that reads from a shared cell the test can move.
  fn manual_clock(start: DateTime<Utc>) -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
    let cell = Arc::new(Mutex::new(start));
    let reader = cell.clone();
    (cell, Arc::new(move || *reader.lock().unwrap()))
  }

  async fn agent(
    remote: Arc<FakeRemote>,
    context: RuntimeContext,
  ) -> (SyncAgent<FakeRemote, SqliteStore>, Arc<SqliteStore>) {
    let mirror = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let agent = SyncAgent::new(
      remote,
      mirror.clone(),
      SyncPolicy::InstalledOrDevelopment,
      context,
    );
    (agent, mirror)
  }

  const INSTALLED: RuntimeContext =
    RuntimeContext { installed: true, development: false };

  #[tokio::test]
  async fn disabled_policy_touches_nothing() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, mirror) = agent(remote.clone(), RuntimeContext::default()).await;

    assert_eq!(agent.run_cycle().await.unwrap(), SyncOutcome::Disabled);
    assert_eq!(remote.calls(), 0);
    assert_eq!(mirror.count().await.unwrap(), 0);
    assert_eq!(agent.state().status, SyncStatus::Idle);
  }

  #[tokio::test]
  async fn first_cycle_pulls_everything_and_sets_the_watermark() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1), song("2", 2)]));
    let (agent, mirror) = agent(remote.clone(), INSTALLED).await;
    let agent = agent.with_clock(|| at(10));
    let mut events = agent.events().subscribe();

    assert_eq!(
      agent.run_cycle().await.unwrap(),
      SyncOutcome::Synced { rows: 2 }
    );
    assert_eq!(remote.last_query(), SongQuery::all());
    assert_eq!(mirror.count().await.unwrap(), 2);
    assert_eq!(agent.watermark().await.unwrap(), Some(at(10)));
    assert_eq!(
      agent.state(),
      SyncState { status: SyncStatus::Idle, last_sync: Some(at(10)) }
    );
    assert_eq!(
      events.try_recv().unwrap(),
      MirrorEvent::Upserted(vec![RecordId::new("1"), RecordId::new("2")])
    );
  }

  #[tokio::test]
  async fn later_cycles_are_incremental() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, mirror) = agent(remote.clone(), INSTALLED).await;
    let (clock, reader) = manual_clock(at(5));
    let agent = agent.with_clock(move || reader());

    agent.run_cycle().await.unwrap();

    remote.songs.lock().unwrap().push(song("2", 7));
    *clock.lock().unwrap() = at(8);
    assert_eq!(
      agent.run_cycle().await.unwrap(),
      SyncOutcome::Synced { rows: 1 }
    );
    assert_eq!(remote.last_query(), SongQuery::since(Some(at(5))));
    assert_eq!(mirror.count().await.unwrap(), 2);

    // Nothing new: the cycle still succeeds and the watermark still moves.
    *clock.lock().unwrap() = at(9);
    assert_eq!(
      agent.run_cycle().await.unwrap(),
      SyncOutcome::Synced { rows: 0 }
    );
    assert_eq!(agent.watermark().await.unwrap(), Some(at(9)));
  }

  #[tokio::test]
  async fn watermark_never_moves_backwards() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, _mirror) = agent(remote, INSTALLED).await;
    let (clock, reader) = manual_clock(at(12));
    let agent = agent.with_clock(move || reader());

    agent.run_cycle().await.unwrap();
    *clock.lock().unwrap() = at(11);
    agent.run_cycle().await.unwrap();
    assert_eq!(agent.watermark().await.unwrap(), Some(at(12)));
  }

  #[tokio::test]
  async fn failure_keeps_the_watermark_and_reports_error() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, _mirror) = agent(remote.clone(), INSTALLED).await;
    let (clock, reader) = manual_clock(at(3));
    let agent = agent.with_clock(move || reader());
    agent.run_cycle().await.unwrap();

    remote.fail(true);
    *clock.lock().unwrap() = at(4);
    assert!(matches!(agent.run_cycle().await, Err(Error::Remote(_))));
    assert_eq!(agent.state().status, SyncStatus::Error);
    assert_eq!(agent.state().last_sync, Some(at(3)));
    assert_eq!(agent.watermark().await.unwrap(), Some(at(3)));

    // Recovery re-fetches everything after the last good watermark.
    remote.fail(false);
    agent.run_cycle().await.unwrap();
    assert_eq!(remote.last_query(), SongQuery::since(Some(at(3))));
    assert_eq!(agent.state().status, SyncStatus::Idle);
  }

  #[tokio::test]
  async fn empty_mirror_ignores_a_stored_watermark() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, mirror) = agent(remote.clone(), INSTALLED).await;
    mirror
      .put_setting(LAST_SYNC_KEY, format_timestamp(at(20)))
      .await
      .unwrap();
    let agent = agent.with_clock(|| at(21));

    assert_eq!(
      agent.run_cycle().await.unwrap(),
      SyncOutcome::Synced { rows: 1 }
    );
    assert_eq!(remote.last_query(), SongQuery::all());
  }

  #[tokio::test]
  async fn unreadable_watermark_means_full_pull() {
    let remote = Arc::new(FakeRemote::with(vec![song("1", 1)]));
    let (agent, mirror) = agent(remote.clone(), INSTALLED).await;
    agent.run_cycle().await.unwrap();
    mirror
      .put_setting(LAST_SYNC_KEY, "yesterday".into())
      .await
      .unwrap();

    agent.run_cycle().await.unwrap();
    assert_eq!(remote.last_query(), SongQuery::all());
  }

  #[tokio::test]
  async fn concurrent_cycle_is_rejected() {
    let remote = Arc::new(FakeRemote::with(vec![]));
    let (agent, _mirror) = agent(remote, INSTALLED).await;

    agent.running.store(true, Ordering::SeqCst);
    assert_eq!(agent.run_cycle().await.unwrap(), SyncOutcome::AlreadyRunning);

    agent.running.store(false, Ordering::SeqCst);
    assert!(matches!(
      agent.run_cycle().await.unwrap(),
      SyncOutcome::Synced { .. }
    ));
    assert!(!agent.running.load(Ordering::SeqCst));
  }
}
