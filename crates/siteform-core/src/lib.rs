//! Organization-hierarchy resolver and scoped-visibility engine.
//!
//! Organizational membership is not stored on most entities; it is derived
//! by walking invitation edges upward until a super_admin (the tenant
//! root) is reached, with a company-ownership fallback when the chain is
//! broken. Everything tenant-scoped flows through the primitives exposed
//! here:
//!
//! - [`resolver::resolve_organization_owner`] — the chain walk
//! - [`scope::compute_scope`] / [`scope::visible_projects`] — tenant scope
//! - [`membership::merge_role_membership`] — accepted + pending merging
//! - [`authz`] — `has_permission` / `has_role` / `can_view`
//!
//! No other module may reimplement the chain walk. All functions take the
//! acting user explicitly; there is no ambient auth state. Resolution is
//! read-only and side-effect-free; mutations (invitation lifecycle,
//! company cascades) delegate atomicity to the [`siteform_storage::Store`]
//! backend.

mod error;

pub mod authz;
pub mod companies;
pub mod invitations;
pub mod membership;
pub mod resolver;
pub mod scope;

pub use error::CoreError;

#[cfg(test)]
mod tests;
