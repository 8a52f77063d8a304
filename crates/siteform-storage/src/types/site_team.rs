//! Site-team membership types.

use chrono::{DateTime, Utc};

use super::{ProjectId, SiteTeamId, UserId};

/// Links a user to a project with an optional role-at-project-level.
#[derive(Clone, Debug)]
pub struct SiteTeamMember {
    pub id: SiteTeamId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Option<String>,
    /// Who added them.
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for adding a site-team member.
#[derive(Clone, Debug)]
pub struct AddSiteTeamParams {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Option<String>,
    pub created_by: Option<UserId>,
}
