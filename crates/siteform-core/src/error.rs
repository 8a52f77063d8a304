use siteform_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the core engine.
///
/// Absence of a resolvable organization is never an error — it is an empty
/// scope (fail-closed). Errors here are either caller defects
/// (`UnknownRole`), policy refusals on the mutation paths, or backend
/// failures passed through.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("user already invited")]
    AlreadyInvited,
    #[error("user already exists")]
    AlreadyRegistered,
    #[error("invalid activation token")]
    InvalidToken,
    #[error("activation token has expired")]
    ExpiredToken,
    #[error("invitation already accepted")]
    AlreadyAccepted,
    #[error(transparent)]
    Store(#[from] StoreError),
}
