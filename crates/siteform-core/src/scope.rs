//! The tenant scope calculator.
//!
//! Given a resolved organization owner, computes the companies, admin
//! users and projects belonging to that tenant. Scope is monotonic in the
//! data: linking one more invitation or company under an owner never
//! removes anything previously visible.

use siteform_storage::{
    CompanyId, Project, ProjectFilter, RoleName, Store, StoreError, User, UserId,
};

use crate::resolver::{resolve_organization_owner, well_known_role};

/// The computed visibility set of one organization.
#[derive(Clone, Debug)]
pub struct TenantScope {
    pub owner_id: UserId,
    pub company_ids: Vec<CompanyId>,
    /// Company names, for matching invitations' free-text company field.
    pub company_names: Vec<String>,
    /// Users who accepted an admin-role invitation issued by the owner.
    pub admin_user_ids: Vec<UserId>,
}

impl TenantScope {
    /// An empty scope for an unresolvable user (fail-closed).
    pub fn empty(owner_id: UserId) -> Self {
        Self {
            owner_id,
            company_ids: Vec::new(),
            company_names: Vec::new(),
            admin_user_ids: Vec::new(),
        }
    }
}

/// Compute the company and admin-user scope of an organization owner.
pub async fn compute_scope(
    store: &dyn Store,
    owner_id: &UserId,
) -> Result<TenantScope, StoreError> {
    let mut companies = store.find_companies_by_creator(owner_id).await?;

    if companies.is_empty() {
        // Older company rows may lack creator linkage; cross-check by the
        // owner's email as company contact.
        if let Some(owner) = store.find_user_by_id(owner_id).await? {
            if let Some(company) = store.find_company_by_email(&owner.email).await? {
                tracing::warn!(owner = %owner_id, company = %company.id,
                    "company ownership resolved by email fallback");
                companies.push(company);
            }
        }
    }

    let admin_invitations = store
        .list_invitations_by_inviter(owner_id, Some(RoleName::Admin), false)
        .await?;
    let admin_emails: Vec<String> = admin_invitations
        .into_iter()
        .map(|invitation| invitation.email)
        .collect();
    let admin_user_ids = store
        .find_users_by_emails(&admin_emails)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect();

    Ok(TenantScope {
        owner_id: *owner_id,
        company_names: companies.iter().map(|c| c.name.clone()).collect(),
        company_ids: companies.into_iter().map(|c| c.id).collect(),
        admin_user_ids,
    })
}

/// Projects visible to a user, role-dependent:
///
/// - super_admin: projects they created
/// - admin: the owner's projects plus their own
/// - manager: owner's, org admins', own, assigned-to-them, site-teamed
/// - leaf roles: owner's, org admins', own, site-teamed
///
/// An unresolvable user sees nothing.
pub async fn visible_projects(store: &dyn Store, user: &User) -> Result<Vec<Project>, StoreError> {
    let role = well_known_role(store, user).await?;

    if role == Some(RoleName::SuperAdmin) {
        return store
            .list_projects(&ProjectFilter {
                created_by: vec![user.id],
                ..ProjectFilter::default()
            })
            .await;
    }

    let Some(resolution) = resolve_organization_owner(store, user).await? else {
        return Ok(Vec::new());
    };
    let owner_id = resolution.owner_id;

    let filter = match role {
        Some(RoleName::Admin) => ProjectFilter {
            created_by: vec![owner_id, user.id],
            ..ProjectFilter::default()
        },
        Some(RoleName::Manager) => {
            let scope = compute_scope(store, &owner_id).await?;
            let mut created_by = vec![owner_id, user.id];
            created_by.extend(scope.admin_user_ids);
            ProjectFilter {
                created_by,
                assigned_admin: Some(user.id),
                assigned_manager: Some(user.id),
                site_team_member: Some(user.id),
            }
        }
        _ => {
            let scope = compute_scope(store, &owner_id).await?;
            let mut created_by = vec![owner_id, user.id];
            created_by.extend(scope.admin_user_ids);
            ProjectFilter {
                created_by,
                site_team_member: Some(user.id),
                ..ProjectFilter::default()
            }
        }
    };

    store.list_projects(&filter).await
}
