//! Core types and trait definitions for Salterio.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it: the song and blog records, the read-side
//! [`store::SongCatalog`] abstraction over a data source, and the
//! [`store::SongMirror`] abstraction over the on-device copy of the catalog.

// Trait futures carry explicit `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod blog;
pub mod error;
pub mod record;
pub mod song;
pub mod store;

pub use error::{Error, Result};
pub use record::RecordId;
