//! HTTP client for the hosted data service.
//!
//! [`RestCatalog`] implements [`salterio_core::store::SongCatalog`] over the
//! service's PostgREST surface: the `cantos` and `blogs` relations under
//! `{url}/rest/v1/`, authenticated with the public anonymous key.

mod client;
mod query;

pub mod error;

pub use client::{RemoteConfig, RestCatalog};
pub use error::{Error, Result};
