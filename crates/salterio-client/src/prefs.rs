//! Player volume and favorite songs, kept in the mirror's settings.

use std::sync::Arc;

use salterio_core::{RecordId, song::Song, store::SongMirror};
use tracing::warn;

use crate::{Error, Result};

pub const VOLUME_KEY: &str = "salterio_volume";
pub const FAVORITES_KEY: &str = "salterio_favorites";
pub const DEFAULT_VOLUME: f32 = 1.0;

pub struct Preferences<M> {
  store: Arc<M>,
}

impl<M: SongMirror> Preferences<M> {
  pub fn new(store: Arc<M>) -> Self { Self { store } }

  // ── Volume ──

  /// Stored volume in `[0, 1]`; unset or unreadable values give the default.
  pub async fn volume(&self) -> Result<f32> {
    let raw = self
      .store
      .get_setting(VOLUME_KEY)
      .await
      .map_err(Error::mirror)?;

    Ok(match raw.as_deref().map(|s| s.trim().parse::<f32>()) {
      None => DEFAULT_VOLUME,
      Some(Ok(v)) if v.is_finite() => v.clamp(0.0, 1.0),
      Some(_) => {
        warn!(value = ?raw, "ignoring unreadable volume");
        DEFAULT_VOLUME
      }
    })
  }

  /// Store `volume`, clamped to `[0, 1]`. Returns the stored value.
  pub async fn set_volume(&self, volume: f32) -> Result<f32> {
    let volume = if volume.is_finite() {
      volume.clamp(0.0, 1.0)
    } else {
      DEFAULT_VOLUME
    };
    self
      .store
      .put_setting(VOLUME_KEY, volume.to_string())
      .await
      .map_err(Error::mirror)?;
    Ok(volume)
  }

  // ── Favorites ──

  /// Favorite song ids in the order they were added.
  pub async fn favorites(&self) -> Result<Vec<RecordId>> {
    let Some(raw) = self
      .store
      .get_setting(FAVORITES_KEY)
      .await
      .map_err(Error::mirror)?
    else {
      return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<RecordId>>(&raw) {
      Ok(ids) => Ok(ids),
      Err(e) => {
        warn!(error = %e, "ignoring unreadable favorites list");
        Ok(Vec::new())
      }
    }
  }

  /// Favorites paired with their mirrored record. A failed mirror read is
  /// logged and reported as a missing record.
  pub async fn favorite_songs(&self) -> Result<Vec<(RecordId, Option<Song>)>> {
    let mut out = Vec::new();
    for id in self.favorites().await? {
      let song = match self.store.get(&id).await {
        Ok(song) => song,
        Err(e) => {
          warn!(%id, error = %e, "mirror read failed for favorite");
          None
        }
      };
      out.push((id, song));
    }
    Ok(out)
  }

  pub async fn is_favorite(&self, id: &RecordId) -> Result<bool> {
    Ok(self.favorites().await?.contains(id))
  }

  /// Append `id` unless present. Returns whether the list changed.
  pub async fn add_favorite(&self, id: RecordId) -> Result<bool> {
    let mut ids = self.favorites().await?;
    if ids.contains(&id) {
      return Ok(false);
    }
    ids.push(id);
    self.save_favorites(&ids).await?;
    Ok(true)
  }

  /// Returns whether the list changed.
  pub async fn remove_favorite(&self, id: &RecordId) -> Result<bool> {
    let mut ids = self.favorites().await?;
    let before = ids.len();
    ids.retain(|f| f != id);
    if ids.len() == before {
      return Ok(false);
    }
    self.save_favorites(&ids).await?;
    Ok(true)
  }

  /// Flip membership of `id`. Returns whether it is now a favorite.
  pub async fn toggle_favorite(&self, id: RecordId) -> Result<bool> {
    if self.remove_favorite(&id).await? {
      Ok(false)
    } else {
      self.add_favorite(id).await
    }
  }

  async fn save_favorites(&self, ids: &[RecordId]) -> Result<()> {
    let raw = serde_json::to_string(ids)?;
    self
      .store
      .put_setting(FAVORITES_KEY, raw)
      .await
      .map_err(Error::mirror)
  }
}
