//! SQLite backend for Salterio: the on-device song mirror, its durable
//! settings, and a read catalog the server can serve from a local file.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
