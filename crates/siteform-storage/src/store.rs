//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait `siteform-core` resolves against.
///
/// Read methods never fail for normal absence of data: a missing row is
/// `Ok(None)` or an empty vec. Mutations that touch several rows
/// (`accept_invitation`, `set_company_status`, `delete_company`) must be a
/// single atomic transaction in the backend.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Create a new user.
    async fn create_user(&self, params: &CreateUserParams) -> Result<User, StoreError>;

    /// Get user by id.
    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, StoreError>;

    /// Get user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up several users by email at once (admin-id derivation).
    async fn find_users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError>;

    /// Users holding a given role inside a set of companies.
    async fn find_users_by_role_and_companies(
        &self,
        role_id: &RoleId,
        company_ids: &[CompanyId],
    ) -> Result<Vec<User>, StoreError>;

    /// All users inside a set of companies (role filtering is the caller's
    /// concern).
    async fn list_users_in_companies(
        &self,
        company_ids: &[CompanyId],
    ) -> Result<Vec<User>, StoreError>;

    /// Set a user's status.
    async fn update_user_status(
        &self,
        user_id: &UserId,
        status: EntityStatus,
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Roles ──────────────────────────────────────────

    /// Create a role with its granted permissions.
    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError>;

    /// Get role by id.
    async fn find_role_by_id(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError>;

    /// Get role by name. Alias-aware: asking for `basic` also finds a row
    /// stored under the legacy name `user`, and vice versa.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    /// All roles.
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Permissions granted to a role.
    async fn role_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<Vec<GrantedPermission>, StoreError>;

    // ─────────────────────────────────── Companies ────────────────────────────────────────

    /// Create a company.
    async fn create_company(&self, params: &CreateCompanyParams) -> Result<Company, StoreError>;

    /// Get company by id.
    async fn find_company_by_id(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<Company>, StoreError>;

    /// Get company by (unique) name.
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError>;

    /// Get company by contact email (legacy creator-linkage fallback).
    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, StoreError>;

    /// Companies created by a user.
    async fn find_companies_by_creator(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Company>, StoreError>;

    /// Set company status and cascade it to all non-super-admin users of
    /// the company, atomically.
    async fn set_company_status(
        &self,
        company_id: &CompanyId,
        status: EntityStatus,
    ) -> Result<Company, StoreError>;

    /// Delete a company together with its non-super-admin users,
    /// atomically.
    async fn delete_company(&self, company_id: &CompanyId) -> Result<(), StoreError>;

    // ─────────────────────────────────── Invitations ──────────────────────────────────────

    /// Create an invitation.
    async fn create_invitation(
        &self,
        params: &CreateInvitationParams,
    ) -> Result<Invitation, StoreError>;

    /// Re-issue an existing pending invitation (superseding re-invite):
    /// refreshes expiry and overwrites name/company/role/inviter.
    async fn refresh_invitation(
        &self,
        invitation_id: &InvitationId,
        params: &CreateInvitationParams,
    ) -> Result<Invitation, StoreError>;

    /// Most recent invitation for an email, optionally restricted to a
    /// well-known role (alias-aware).
    async fn find_invitation(
        &self,
        email: &str,
        role: Option<RoleName>,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Get invitation by id.
    async fn find_invitation_by_id(
        &self,
        invitation_id: &InvitationId,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Get invitation by one-time token.
    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Invitations issued by a user, optionally restricted to a well-known
    /// role (alias-aware) and/or to pending ones.
    async fn list_invitations_by_inviter(
        &self,
        inviter: &UserId,
        role: Option<RoleName>,
        pending_only: bool,
    ) -> Result<Vec<Invitation>, StoreError>;

    /// Pending invitations issued by `inviter` OR targeting one of the
    /// named companies (the membership-merger candidate set).
    async fn list_pending_invitations(
        &self,
        inviter: &UserId,
        company_names: &[String],
    ) -> Result<Vec<Invitation>, StoreError>;

    /// Delete an invitation (cancellation or superseding re-invite).
    async fn delete_invitation(&self, invitation_id: &InvitationId) -> Result<(), StoreError>;

    /// Atomically: mark the invitation accepted, find-or-create the
    /// company it names, create or update the invited user. Returns the
    /// resulting user.
    async fn accept_invitation(&self, params: &AcceptInvitationParams)
        -> Result<User, StoreError>;

    // ──────────────────────────────────── Projects ────────────────────────────────────────

    /// Create a project.
    async fn create_project(&self, params: &CreateProjectParams) -> Result<Project, StoreError>;

    /// Get project by id.
    async fn find_project_by_id(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Project>, StoreError>;

    /// Set assigned admin/manager on a project.
    async fn assign_project(
        &self,
        project_id: &ProjectId,
        assigned_admin_id: Option<UserId>,
        assigned_manager_id: Option<UserId>,
    ) -> Result<Project, StoreError>;

    /// Projects matching the disjunctive visibility filter.
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError>;

    // ──────────────────────────────────── Site team ───────────────────────────────────────

    /// Add a site-team member to a project.
    async fn add_site_team_member(
        &self,
        params: &AddSiteTeamParams,
    ) -> Result<SiteTeamMember, StoreError>;

    /// Site team of a project.
    async fn list_site_team(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<SiteTeamMember>, StoreError>;

    /// Project memberships of a user.
    async fn list_site_memberships(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SiteTeamMember>, StoreError>;

    /// Remove the whole site team of a project (assignment replacement).
    async fn clear_site_team(&self, project_id: &ProjectId) -> Result<(), StoreError>;
}
