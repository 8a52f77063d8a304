//! User types.
//!
//! A user's organizational identity is not a column here; it is derived by
//! `siteform-core` from invitation edges and company ownership.

use chrono::{DateTime, Utc};

use super::{CompanyId, EntityStatus, RoleId, UserId};

/// User record.
#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub role_id: Option<RoleId>,
    /// None for super_admin users (they own companies, they belong to none).
    pub company_id: Option<CompanyId>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a user.
#[derive(Clone, Debug)]
pub struct CreateUserParams {
    pub name: Option<String>,
    pub email: String,
    pub role_id: Option<RoleId>,
    pub company_id: Option<CompanyId>,
    pub status: EntityStatus,
}
