//! The invitation chain walker.
//!
//! Given a user, finds the super_admin at the root of their organization
//! by following `Invitation.invited_by` edges upward, bounded to three
//! hops (leaf → manager → admin → super_admin). Whenever the chain yields
//! nothing, company ownership is tried as a fallback: the creator of the
//! user's company is the organization owner by convention.
//!
//! The walk is a pure function of the store snapshot: same snapshot, same
//! answer. A returned owner is always a super_admin — an edge pointing at
//! anyone else means the chain is broken at that point, never guessed
//! around.

use siteform_storage::{RoleName, Store, StoreError, User, UserId};

/// Which path resolved the organization owner. Kept explicit so callers
/// and tests can observe the walk instead of re-deriving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionPath {
    /// The user is a super_admin and therefore their own organization root.
    SelfOwner,
    /// Invited directly by the super_admin.
    DirectInvite,
    /// One hop up through the admin who invited them.
    ViaAdmin,
    /// Two hops up through a manager, then that manager's inviter.
    ViaManager,
    /// Chain broken or absent; resolved through company ownership.
    CompanyFallback,
}

/// A resolved organization owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerResolution {
    pub owner_id: UserId,
    pub path: ResolutionPath,
}

impl OwnerResolution {
    fn new(owner_id: UserId, path: ResolutionPath) -> Self {
        Self { owner_id, path }
    }
}

/// The well-known role a user currently holds, if any.
pub(crate) async fn well_known_role(
    store: &dyn Store,
    user: &User,
) -> Result<Option<RoleName>, StoreError> {
    let Some(role_id) = user.role_id else {
        return Ok(None);
    };
    let Some(role) = store.find_role_by_id(&role_id).await? else {
        return Ok(None);
    };
    Ok(role.well_known())
}

/// Resolve the super_admin owning the organization `user` belongs to.
///
/// Returns `Ok(None)` when neither the invitation chain nor the company
/// fallback resolves; callers must treat that as "no visible organization"
/// and produce empty result sets, never an error.
pub async fn resolve_organization_owner(
    store: &dyn Store,
    user: &User,
) -> Result<Option<OwnerResolution>, StoreError> {
    let role = well_known_role(store, user).await?;

    if role == Some(RoleName::SuperAdmin) {
        return Ok(Some(OwnerResolution::new(
            user.id,
            ResolutionPath::SelfOwner,
        )));
    }

    let via_chain = match role {
        Some(RoleName::Admin) => owner_of_admin(store, &user.email)
            .await?
            .map(|owner| OwnerResolution::new(owner, ResolutionPath::DirectInvite)),
        Some(RoleName::Manager) => owner_of_manager(store, &user.email).await?,
        _ => owner_of_leaf(store, &user.email).await?,
    };

    if let Some(resolution) = via_chain {
        return Ok(Some(resolution));
    }

    company_fallback(store, user).await
}

/// The super_admin who issued an admin-role invitation to `email`.
/// The inviter must itself be a super_admin, otherwise the chain is
/// considered broken here.
async fn owner_of_admin(store: &dyn Store, email: &str) -> Result<Option<UserId>, StoreError> {
    let Some(invitation) = store.find_invitation(email, Some(RoleName::Admin)).await? else {
        return Ok(None);
    };
    let Some(inviter) = store.find_user_by_id(&invitation.invited_by).await? else {
        return Ok(None);
    };
    if well_known_role(store, &inviter).await? == Some(RoleName::SuperAdmin) {
        Ok(Some(inviter.id))
    } else {
        Ok(None)
    }
}

/// Walk a manager's invitation one or two hops up.
///
/// A manager invited by another manager is unresolvable via the chain;
/// the company fallback applies instead (one consistent policy, see
/// DESIGN.md).
async fn owner_of_manager(
    store: &dyn Store,
    email: &str,
) -> Result<Option<OwnerResolution>, StoreError> {
    let Some(invitation) = store.find_invitation(email, Some(RoleName::Manager)).await? else {
        return Ok(None);
    };
    let Some(inviter) = store.find_user_by_id(&invitation.invited_by).await? else {
        return Ok(None);
    };
    match well_known_role(store, &inviter).await? {
        Some(RoleName::SuperAdmin) => Ok(Some(OwnerResolution::new(
            inviter.id,
            ResolutionPath::DirectInvite,
        ))),
        Some(RoleName::Admin) => Ok(owner_of_admin(store, &inviter.email)
            .await?
            .map(|owner| OwnerResolution::new(owner, ResolutionPath::ViaAdmin))),
        _ => Ok(None),
    }
}

/// Walk a leaf user's invitation (any role) up to three hops.
async fn owner_of_leaf(
    store: &dyn Store,
    email: &str,
) -> Result<Option<OwnerResolution>, StoreError> {
    let Some(invitation) = store.find_invitation(email, None).await? else {
        return Ok(None);
    };
    let Some(inviter) = store.find_user_by_id(&invitation.invited_by).await? else {
        return Ok(None);
    };
    match well_known_role(store, &inviter).await? {
        Some(RoleName::SuperAdmin) => Ok(Some(OwnerResolution::new(
            inviter.id,
            ResolutionPath::DirectInvite,
        ))),
        Some(RoleName::Admin) => Ok(owner_of_admin(store, &inviter.email)
            .await?
            .map(|owner| OwnerResolution::new(owner, ResolutionPath::ViaAdmin))),
        Some(RoleName::Manager) => {
            // Third hop: the manager's own inviter.
            let Some(manager_invitation) = store
                .find_invitation(&inviter.email, Some(RoleName::Manager))
                .await?
            else {
                return Ok(None);
            };
            let Some(manager_inviter) = store
                .find_user_by_id(&manager_invitation.invited_by)
                .await?
            else {
                return Ok(None);
            };
            match well_known_role(store, &manager_inviter).await? {
                Some(RoleName::SuperAdmin) => Ok(Some(OwnerResolution::new(
                    manager_inviter.id,
                    ResolutionPath::ViaManager,
                ))),
                Some(RoleName::Admin) => Ok(owner_of_admin(store, &manager_inviter.email)
                    .await?
                    .map(|owner| OwnerResolution::new(owner, ResolutionPath::ViaManager))),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

/// Resolve through company ownership: the creator of the user's company,
/// or — when the creator is an admin — that admin's own inviter.
async fn company_fallback(
    store: &dyn Store,
    user: &User,
) -> Result<Option<OwnerResolution>, StoreError> {
    let Some(company_id) = user.company_id else {
        return Ok(None);
    };
    let Some(company) = store.find_company_by_id(&company_id).await? else {
        return Ok(None);
    };
    let Some(creator_id) = company.created_by_user_id else {
        return Ok(None);
    };
    let Some(creator) = store.find_user_by_id(&creator_id).await? else {
        return Ok(None);
    };
    let owner = match well_known_role(store, &creator).await? {
        Some(RoleName::SuperAdmin) => Some(creator.id),
        Some(RoleName::Admin) => owner_of_admin(store, &creator.email).await?,
        _ => None,
    };
    if let Some(owner_id) = owner {
        tracing::debug!(user = %user.id, owner = %owner_id, "organization resolved via company fallback");
        return Ok(Some(OwnerResolution::new(
            owner_id,
            ResolutionPath::CompanyFallback,
        )));
    }
    Ok(None)
}
