//! Core engine tests.
//!
//! Everything runs against an in-memory SQLite store seeded with the
//! well-known roles. Fixtures build organizations the way production
//! does: through the invitation lifecycle, not by poking rows — except
//! where a test deliberately plants a legacy or broken row.
//!
//! - `common` - shared fixtures
//! - `resolver` - invitation chain walk
//! - `scope` - tenant scope and project visibility
//! - `membership` - accepted + pending merging
//! - `authz` - permission and row-level checks
//! - `invitations` - invitation lifecycle
//! - `companies` - company management gates

pub mod common;

mod authz;
mod companies;
mod invitations;
mod resolver;
