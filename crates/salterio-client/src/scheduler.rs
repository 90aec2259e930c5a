//! Periodic driver for a [`SyncAgent`].

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use salterio_core::store::{SongCatalog, SongMirror};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

use crate::sync::SyncAgent;

/// Time between scheduled cycles.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Whether the device currently has network access.
pub trait Connectivity: Send + Sync + 'static {
  fn is_online(&self) -> bool;
}

/// Assumes the network is always reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
  fn is_online(&self) -> bool { true }
}

/// A connectivity flag flipped by whoever watches the network.
#[derive(Debug, Clone)]
pub struct OnlineFlag(Arc<AtomicBool>);

impl OnlineFlag {
  pub fn new(online: bool) -> Self { Self(Arc::new(AtomicBool::new(online))) }

  pub fn set(&self, online: bool) { self.0.store(online, Ordering::Release); }
}

impl Connectivity for OnlineFlag {
  fn is_online(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Runs one cycle at start, then one per interval while online.
///
/// Ticks that fall while offline are skipped, not queued. Dropping the
/// scheduler stops it; a cycle in flight is cancelled at its next await.
pub struct SyncScheduler {
  handle: JoinHandle<()>,
}

impl SyncScheduler {
  pub fn start<R, M, C>(
    agent: Arc<SyncAgent<R, M>>,
    interval: Duration,
    connectivity: C,
  ) -> Self
  where
    R: SongCatalog + 'static,
    M: SongMirror + 'static,
    C: Connectivity,
  {
    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

      // The first tick completes immediately; its cycle ignores connectivity.
      ticker.tick().await;
      let _ = agent.run_cycle().await;

      loop {
        ticker.tick().await;
        if !connectivity.is_online() {
          debug!("offline, skipping scheduled sync");
          continue;
        }
        // Failures are already logged and reflected in the agent state.
        let _ = agent.run_cycle().await;
      }
    });

    Self { handle }
  }

  pub fn stop(self) { self.handle.abort(); }

  pub fn is_running(&self) -> bool { !self.handle.is_finished() }
}

impl Drop for SyncScheduler {
  fn drop(&mut self) { self.handle.abort(); }
}
