//! Project types.

use chrono::{DateTime, Utc};

use super::{ProjectId, UserId};

/// Project record (visibility-relevant columns only; floor plans, tasks
/// and annotations hang off the project in other services).
#[derive(Clone, Debug)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub created_by: UserId,
    pub assigned_admin_id: Option<UserId>,
    pub assigned_manager_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a project.
#[derive(Clone, Debug)]
pub struct CreateProjectParams {
    pub title: String,
    pub created_by: UserId,
    pub assigned_admin_id: Option<UserId>,
    pub assigned_manager_id: Option<UserId>,
}

/// Disjunctive visibility predicate for project listings: a project
/// matches if its creator is in `created_by`, or it is assigned to or
/// site-teamed with the named user.
#[derive(Clone, Debug, Default)]
pub struct ProjectFilter {
    pub created_by: Vec<UserId>,
    pub assigned_admin: Option<UserId>,
    pub assigned_manager: Option<UserId>,
    pub site_team_member: Option<UserId>,
}
