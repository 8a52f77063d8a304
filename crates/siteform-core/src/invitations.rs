//! Invitation lifecycle: invite, activate, cancel.
//!
//! State machine: pending → accepted (terminal, on activation) or
//! pending → deleted (terminal, on cancellation or superseding re-invite).
//! An accepted invitation is immutable and retained as an audit trail of
//! the organization edge it created.

use chrono::{Duration, Utc};
use rand_core::RngCore;
use siteform_storage::{
    AcceptInvitationParams, CompanyId, CreateInvitationParams, Invitation, InvitationId, RoleId,
    RoleName, Store, User,
};

use crate::authz::{has_permission, has_role};
use crate::resolver::well_known_role;
use crate::CoreError;

/// How long a fresh invitation stays valid.
const INVITATION_TTL_DAYS: i64 = 7;

/// A requested invitation. Role may arrive as a row id or as a (possibly
/// display-aliased) name; company likewise as an id or free text.
#[derive(Clone, Debug)]
pub struct NewInvitation {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub company_id: Option<CompanyId>,
    pub role: Option<String>,
    pub role_id: Option<RoleId>,
}

/// Generate a one-time activation token (48 hex chars).
fn new_token() -> String {
    let mut bytes = [0u8; 24];
    rand_core::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create an invitation on behalf of `inviter`.
///
/// Gates: the `invite_users` permission, and the role hierarchy — each
/// role may only invite roles below its own rung. A role name that maps to
/// no role row is refused here, at creation time, never coerced later.
pub async fn invite_user(
    store: &dyn Store,
    inviter: &User,
    request: &NewInvitation,
) -> Result<Invitation, CoreError> {
    if !has_permission(store, inviter, "invite_users", None).await? {
        return Err(CoreError::Forbidden(
            "insufficient permissions to invite users",
        ));
    }

    let role = match (request.role_id, request.role.as_deref()) {
        (Some(role_id), _) => store
            .find_role_by_id(&role_id)
            .await?
            .ok_or_else(|| CoreError::UnknownRole(role_id.to_string()))?,
        (None, Some(name)) => store
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| CoreError::UnknownRole(name.to_string()))?,
        (None, None) => return Err(CoreError::UnknownRole("(missing)".to_string())),
    };
    let requested = role
        .well_known()
        .ok_or_else(|| CoreError::UnknownRole(role.name.clone()))?;

    let inviter_role = well_known_role(store, inviter)
        .await?
        .ok_or(CoreError::Forbidden("invalid inviter role"))?;
    if !inviter_role.invitable_roles().contains(&requested) {
        return Err(CoreError::Forbidden("cannot invite users with this role"));
    }

    // Registered users first: refusing here must not disturb the accepted
    // invitation that forms their organization edge.
    if store.find_user_by_email(&request.email).await?.is_some() {
        return Err(CoreError::AlreadyRegistered);
    }

    let company = match request.company_id {
        Some(company_id) => store
            .find_company_by_id(&company_id)
            .await?
            .map(|company| company.name)
            .or_else(|| request.company.clone()),
        None => request.company.clone(),
    };
    let params = CreateInvitationParams {
        email: request.email.clone(),
        name: request.name.clone(),
        company,
        role: Some(requested.as_str().to_string()),
        // keep the client's spelling for display-alias matching
        frontend_role: request.role.clone(),
        invited_by: inviter.id,
        token: new_token(),
        expires_at: Utc::now() + Duration::days(INVITATION_TTL_DAYS),
    };

    if let Some(existing) = store.find_invitation(&request.email, None).await? {
        if existing.is_pending() {
            if !existing.is_expired(Utc::now()) {
                return Err(CoreError::AlreadyInvited);
            }
            // Expired but never cancelled: re-issue in place with a fresh
            // token instead of stacking rows for the same address.
            let invitation = store.refresh_invitation(&existing.id, &params).await?;
            tracing::info!(invitation = %invitation.id, email = %invitation.email,
                role = requested.as_str(), inviter = %inviter.id, "invitation re-issued");
            return Ok(invitation);
        }
        // Stale accepted row without a surviving user: superseded.
        store.delete_invitation(&existing.id).await?;
    }

    let invitation = store.create_invitation(&params).await?;

    tracing::info!(invitation = %invitation.id, email = %invitation.email,
        role = requested.as_str(), inviter = %inviter.id, "invitation created");
    Ok(invitation)
}

/// Roles the user is allowed to invite, or empty when they may not invite
/// at all. super_admin and admin may invite even without the explicit
/// permission row.
pub async fn available_invite_roles(
    store: &dyn Store,
    user: &User,
) -> Result<Vec<RoleName>, CoreError> {
    let role = well_known_role(store, user).await?;
    let allowed = has_permission(store, user, "invite_users", None).await?
        || matches!(role, Some(RoleName::SuperAdmin | RoleName::Admin));
    if !allowed {
        return Ok(Vec::new());
    }
    Ok(role.map_or_else(Vec::new, |r| r.invitable_roles().to_vec()))
}

/// Consume an activation token: validates expiry and role, then delegates
/// the accept + company find-or-create + user upsert to the store as one
/// transaction. Expired tokens are deleted and refused.
pub async fn activate_invitation(store: &dyn Store, token: &str) -> Result<User, CoreError> {
    let Some(invitation) = store.find_invitation_by_token(token).await? else {
        return Err(CoreError::InvalidToken);
    };
    if invitation.accepted_at.is_some() {
        return Err(CoreError::AlreadyAccepted);
    }
    if invitation.is_expired(Utc::now()) {
        store.delete_invitation(&invitation.id).await?;
        return Err(CoreError::ExpiredToken);
    }

    let role_name = invitation
        .role
        .as_deref()
        .or(invitation.frontend_role.as_deref())
        .ok_or_else(|| CoreError::UnknownRole("(missing)".to_string()))?;
    let role = store
        .find_role_by_name(role_name)
        .await?
        .ok_or_else(|| CoreError::UnknownRole(role_name.to_string()))?;

    let user = store
        .accept_invitation(&AcceptInvitationParams {
            invitation_id: invitation.id,
            role_id: role.id,
            owner_role: role.well_known() == Some(RoleName::SuperAdmin),
        })
        .await?;

    tracing::info!(invitation = %invitation.id, user = %user.id, "invitation accepted");
    Ok(user)
}

/// Cancel a pending invitation. Allowed for the inviter, a super_admin,
/// or anyone holding `invite_users`. Accepted invitations are immutable.
pub async fn cancel_invitation(
    store: &dyn Store,
    acting: &User,
    invitation_id: &InvitationId,
) -> Result<(), CoreError> {
    let Some(invitation) = store.find_invitation_by_id(invitation_id).await? else {
        return Err(CoreError::Store(siteform_storage::StoreError::NotFound));
    };

    let allowed = invitation.invited_by == acting.id
        || has_role(store, acting, RoleName::SuperAdmin).await?
        || has_permission(store, acting, "invite_users", None).await?;
    if !allowed {
        return Err(CoreError::Forbidden(
            "insufficient permissions to cancel invitation",
        ));
    }
    if invitation.accepted_at.is_some() {
        return Err(CoreError::AlreadyAccepted);
    }

    store.delete_invitation(&invitation.id).await?;
    tracing::info!(invitation = %invitation.id, by = %acting.id, "invitation cancelled");
    Ok(())
}
