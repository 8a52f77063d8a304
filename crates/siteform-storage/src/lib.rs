//! Storage abstraction for siteform.
//!
//! Backend crates (e.g., siteform-store-sqlite) implement the [`Store`]
//! trait so `siteform-core` doesn't depend on any specific database engine
//! or schema details. Organizational membership is *derived* by the core
//! from the records exposed here; nothing in this crate walks the
//! invitation chain itself.

use thiserror::Error;

mod store;
mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
///
/// Normal absence of data on the read paths the resolver consumes is
/// `Ok(None)` / an empty vec, never an error. `NotFound` is reserved for
/// lookups whose caller asserted existence (mutations on a named row).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
