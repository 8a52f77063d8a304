//! The authorization gate.
//!
//! Endpoint-level checks (`has_permission`, `has_role`) and row-level
//! checks (`can_view` and friends) are independent layers; both must be
//! applied, neither substitutes for the other. Everything here returns
//! booleans — turning a denial into 403 or 404 is the caller's security
//! posture, not ours.

use siteform_storage::{Project, RoleName, Store, StoreError, User};

use crate::resolver::{resolve_organization_owner, well_known_role};

/// Whether the user currently holds the given well-known role.
pub async fn has_role(store: &dyn Store, user: &User, role: RoleName) -> Result<bool, StoreError> {
    Ok(well_known_role(store, user).await? == Some(role))
}

/// Whether the user's role grants `permission`, optionally within a
/// requested scope. super_admin is a wildcard. A grant satisfies a scoped
/// request when its scope equals the requested one or is `full`.
pub async fn has_permission(
    store: &dyn Store,
    user: &User,
    permission: &str,
    scope: Option<&str>,
) -> Result<bool, StoreError> {
    let Some(role_id) = user.role_id else {
        return Ok(false);
    };
    let Some(role) = store.find_role_by_id(&role_id).await? else {
        return Ok(false);
    };
    if role.well_known() == Some(RoleName::SuperAdmin) {
        return Ok(true);
    }
    let grants = store.role_permissions(&role.id).await?;
    Ok(grants
        .iter()
        .any(|grant| grant.permission == permission && grant.scope.satisfies(scope)))
}

/// Row-level visibility of a project: creator, assigned admin/manager,
/// site-team member, same company as the creator, or same resolved
/// organization owner as the creator. Agrees with the scope calculator by
/// construction — both end at `resolve_organization_owner`.
pub async fn can_view(
    store: &dyn Store,
    user: &User,
    project: &Project,
) -> Result<bool, StoreError> {
    if project.created_by == user.id
        || project.assigned_admin_id == Some(user.id)
        || project.assigned_manager_id == Some(user.id)
    {
        return Ok(true);
    }

    if store
        .list_site_team(&project.id)
        .await?
        .iter()
        .any(|member| member.user_id == user.id)
    {
        return Ok(true);
    }

    let creator = store.find_user_by_id(&project.created_by).await?;

    if let (Some(company_id), Some(creator)) = (user.company_id, creator.as_ref()) {
        if creator.company_id == Some(company_id) {
            return Ok(true);
        }
    }

    let Some(creator) = creator else {
        return Ok(false);
    };
    let user_owner = resolve_organization_owner(store, user).await?;
    let creator_owner = resolve_organization_owner(store, &creator).await?;
    Ok(matches!(
        (user_owner, creator_owner),
        (Some(a), Some(b)) if a.owner_id == b.owner_id
    ))
}

/// Whether the user may create projects: explicit permission, or the
/// super_admin / admin roles by default.
pub async fn can_create_project(store: &dyn Store, user: &User) -> Result<bool, StoreError> {
    if has_permission(store, user, "create_project", None).await? {
        return Ok(true);
    }
    Ok(matches!(
        well_known_role(store, user).await?,
        Some(RoleName::SuperAdmin | RoleName::Admin)
    ))
}

/// Whether the user may update a project: explicit permission, creator,
/// or an admin in the creator's company. Managers may not update projects.
pub async fn can_update_project(
    store: &dyn Store,
    user: &User,
    project: &Project,
) -> Result<bool, StoreError> {
    if has_permission(store, user, "edit_project", None).await? {
        return Ok(true);
    }
    if project.created_by == user.id {
        return Ok(true);
    }
    if well_known_role(store, user).await? == Some(RoleName::Admin) {
        if let (Some(company_id), Some(creator)) = (
            user.company_id,
            store.find_user_by_id(&project.created_by).await?,
        ) {
            if creator.company_id == Some(company_id) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Whether the user may delete a project: explicit permission, or the
/// same rules as updating.
pub async fn can_delete_project(
    store: &dyn Store,
    user: &User,
    project: &Project,
) -> Result<bool, StoreError> {
    if has_permission(store, user, "delete_project", None).await? {
        return Ok(true);
    }
    can_update_project(store, user, project).await
}
