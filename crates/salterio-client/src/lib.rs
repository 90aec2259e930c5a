//! Offline-first client for Salterio.
//!
//! The client owns a local SQLite mirror of the song catalog. A
//! [`sync::SyncAgent`] keeps it fresh from the remote data service, driven
//! periodically by a [`scheduler::SyncScheduler`]; a
//! [`resolver::SongResolver`] hands the presentation layer the best record
//! available for a song and refines it as better sources answer.

// Native `async fn` in traits; see `salterio-core`.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod context;
pub mod error;
pub mod prefs;
pub mod resolver;
pub mod scheduler;
pub mod snapshot;
pub mod sync;

pub use error::{Error, Result};

#[cfg(test)]
mod test_support;
