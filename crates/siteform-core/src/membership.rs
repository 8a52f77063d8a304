//! The membership merger.
//!
//! Combines accepted memberships (real user rows inside the scope) with
//! pending ones (unaccepted invitations matching the role by legacy `role`
//! or `frontend_role` alias, case-insensitively) into unified counts and
//! listings. The two sets are disjoint by construction — an invitation is
//! accepted or deleted before its user row could ever count as accepted —
//! so the merger never deduplicates at runtime.

use chrono::{DateTime, Utc};
use serde::Serialize;
use siteform_storage::{
    EntityStatus, Invitation, Role, RoleName, Store, StoreError, User, UserId,
};

use crate::resolver::{resolve_organization_owner, well_known_role};
use crate::scope::{compute_scope, TenantScope};
use crate::CoreError;

/// One row of a combined member listing. Pending entries carry a
/// synthetic `invited_<id>` identifier and `invited: true` so they are
/// distinguishable from real members.
#[derive(Clone, Debug, Serialize)]
pub struct MemberEntry {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: Option<String>,
    pub status: Option<EntityStatus>,
    pub invited: bool,
    pub created_at: DateTime<Utc>,
}

impl MemberEntry {
    fn accepted(user: &User, role_name: Option<&str>) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: role_name.map(str::to_string),
            status: Some(user.status),
            invited: false,
            created_at: user.created_at,
        }
    }

    fn pending(invitation: &Invitation) -> Self {
        Self {
            id: format!("invited_{}", invitation.id),
            name: invitation.name.clone(),
            email: invitation.email.clone(),
            role: invitation.role.clone(),
            status: None,
            invited: true,
            created_at: invitation.created_at,
        }
    }
}

/// Accepted and pending membership of one role within one scope.
#[derive(Clone, Debug)]
pub struct RoleMembership {
    pub role: Role,
    pub accepted: Vec<User>,
    pub pending: Vec<Invitation>,
}

impl RoleMembership {
    pub fn count(&self) -> usize {
        self.accepted.len() + self.pending.len()
    }

    /// Combined listing: accepted members first, then pending placeholders.
    pub fn entries(&self) -> Vec<MemberEntry> {
        self.accepted
            .iter()
            .map(|user| MemberEntry::accepted(user, Some(self.role.name.as_str())))
            .chain(self.pending.iter().map(MemberEntry::pending))
            .collect()
    }
}

fn invitation_matches_role(invitation: &Invitation, role: &Role) -> bool {
    let matches = |raw: Option<&str>| {
        raw.is_some_and(|value| match role.well_known() {
            Some(known) => known.matches(value),
            None => value.eq_ignore_ascii_case(&role.name),
        })
    };
    matches(invitation.role.as_deref()) || matches(invitation.frontend_role.as_deref())
}

/// Merge accepted users and pending invitations for a role within a scope.
pub async fn merge_role_membership(
    store: &dyn Store,
    role: &Role,
    scope: &TenantScope,
    requesting_user: &UserId,
) -> Result<RoleMembership, StoreError> {
    let accepted = if scope.company_ids.is_empty() {
        Vec::new()
    } else {
        store
            .find_users_by_role_and_companies(&role.id, &scope.company_ids)
            .await?
    };

    let pending = store
        .list_pending_invitations(requesting_user, &scope.company_names)
        .await?
        .into_iter()
        .filter(|invitation| invitation_matches_role(invitation, role))
        .collect();

    Ok(RoleMembership {
        role: role.clone(),
        accepted,
        pending,
    })
}

/// Like [`merge_role_membership`], but resolving the role by name first.
/// A name that maps to no role row is a caller defect.
pub async fn merge_role_membership_by_name(
    store: &dyn Store,
    role_name: &str,
    scope: &TenantScope,
    requesting_user: &UserId,
) -> Result<RoleMembership, CoreError> {
    let role = store
        .find_role_by_name(role_name)
        .await?
        .ok_or_else(|| CoreError::UnknownRole(role_name.to_string()))?;
    Ok(merge_role_membership(store, &role, scope, requesting_user).await?)
}

/// Per-role merged counts and listings for a super admin's organization.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardCounts {
    pub user_count: usize,
    pub companies_count: usize,
    pub admins_count: usize,
    pub managers_count: usize,
    pub subcontractors_count: usize,
    pub basic_count: usize,
    pub admins: Vec<MemberEntry>,
    pub managers: Vec<MemberEntry>,
}

async fn role_count(
    store: &dyn Store,
    name: RoleName,
    scope: &TenantScope,
    requester: &UserId,
) -> Result<Option<RoleMembership>, StoreError> {
    let Some(role) = store.find_role_by_name(name.as_str()).await? else {
        return Ok(None);
    };
    Ok(Some(merge_role_membership(store, &role, scope, requester).await?))
}

/// Organization dashboard for a super admin: merged counts per role plus
/// the merged admin and manager listings.
pub async fn organization_dashboard(
    store: &dyn Store,
    acting: &User,
) -> Result<DashboardCounts, CoreError> {
    if well_known_role(store, acting).await? != Some(RoleName::SuperAdmin) {
        return Err(CoreError::Forbidden(
            "only a super admin has an organization dashboard",
        ));
    }

    let scope = compute_scope(store, &acting.id).await?;
    let user_count = store.list_users_in_companies(&scope.company_ids).await?.len();

    let admins = role_count(store, RoleName::Admin, &scope, &acting.id).await?;
    let managers = role_count(store, RoleName::Manager, &scope, &acting.id).await?;
    let subcontractors = role_count(store, RoleName::Subcontractor, &scope, &acting.id).await?;
    let basic = role_count(store, RoleName::Basic, &scope, &acting.id).await?;

    Ok(DashboardCounts {
        user_count,
        companies_count: scope.company_ids.len(),
        admins_count: admins.as_ref().map_or(0, RoleMembership::count),
        managers_count: managers.as_ref().map_or(0, RoleMembership::count),
        subcontractors_count: subcontractors.as_ref().map_or(0, RoleMembership::count),
        basic_count: basic.as_ref().map_or(0, RoleMembership::count),
        admins: admins.as_ref().map_or_else(Vec::new, RoleMembership::entries),
        managers: managers.as_ref().map_or_else(Vec::new, RoleMembership::entries),
    })
}

/// Scope-wide user listing with pending invitations appended, filtered by
/// the acting user's rung on the role hierarchy: an admin never sees
/// super_admins or other admins, a manager additionally never sees other
/// managers. Only super_admin, admin and manager may list users at all.
pub async fn list_organization_users(
    store: &dyn Store,
    acting: &User,
) -> Result<Vec<MemberEntry>, CoreError> {
    let acting_role = well_known_role(store, acting).await?;
    let excluded: &[RoleName] = match acting_role {
        Some(RoleName::SuperAdmin) => &[],
        Some(RoleName::Admin) => &[RoleName::SuperAdmin, RoleName::Admin],
        Some(RoleName::Manager) => &[RoleName::SuperAdmin, RoleName::Admin, RoleName::Manager],
        _ => {
            return Err(CoreError::Forbidden(
                "only super_admin, admin and manager can list users",
            ))
        }
    };

    let Some(resolution) = resolve_organization_owner(store, acting).await? else {
        return Ok(Vec::new());
    };
    let scope = compute_scope(store, &resolution.owner_id).await?;

    let roles = store.list_roles().await?;
    let role_of = |user: &User| {
        user.role_id
            .and_then(|id| roles.iter().find(|role| role.id == id))
    };

    let mut entries: Vec<MemberEntry> = store
        .list_users_in_companies(&scope.company_ids)
        .await?
        .iter()
        .filter(|user| {
            role_of(user)
                .and_then(Role::well_known)
                .is_none_or(|known| !excluded.contains(&known))
        })
        .map(|user| MemberEntry::accepted(user, role_of(user).map(|role| role.name.as_str())))
        .collect();

    let invitations = store
        .list_invitations_by_inviter(&acting.id, None, true)
        .await?;
    entries.extend(
        invitations
            .iter()
            .filter(|invitation| {
                invitation
                    .role
                    .as_deref()
                    .and_then(|raw| raw.parse::<RoleName>().ok())
                    .is_none_or(|known| !excluded.contains(&known))
            })
            .map(MemberEntry::pending),
    );

    Ok(entries)
}
