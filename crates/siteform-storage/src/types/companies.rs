//! Company types.

use chrono::{DateTime, Utc};

use super::{CompanyId, EntityStatus, UserId};

/// Company record.
///
/// The creator is, by convention, a super_admin; legacy rows may lack the
/// linkage, in which case ownership is cross-checked by company email.
#[derive(Clone, Debug)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub email: Option<String>,
    pub status: EntityStatus,
    pub created_by_user_id: Option<UserId>,
    pub activated_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a company.
#[derive(Clone, Debug)]
pub struct CreateCompanyParams {
    pub name: String,
    pub email: Option<String>,
    pub status: EntityStatus,
    pub created_by_user_id: Option<UserId>,
}
