//! Invitation lifecycle tests.

use chrono::{Duration, Utc};
use siteform_storage::*;

use crate::invitations::{
    activate_invitation, available_invite_roles, cancel_invitation, invite_user, NewInvitation,
};
use crate::tests::common::*;
use crate::CoreError;

#[tokio::test]
async fn the_hierarchy_caps_who_can_be_invited() {
    let org = standard_org().await;

    let result = invite_user(
        &org.store,
        &org.manager,
        &NewInvitation {
            email: "escalation@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            company_id: None,
            role: Some("admin".to_string()),
            role_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::Forbidden(_))));

    let roles = available_invite_roles(&org.store, &org.admin).await.unwrap();
    assert_eq!(
        roles,
        [RoleName::Manager, RoleName::Subcontractor, RoleName::Basic]
    );

    let worker =
        invite_and_activate(&org.store, &org.manager, "w@acme.test", RoleName::Basic, "Acme")
            .await;
    assert!(available_invite_roles(&org.store, &worker)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_roles_are_refused_at_creation() {
    let org = standard_org().await;
    let result = invite_user(
        &org.store,
        &org.owner,
        &NewInvitation {
            email: "x@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            company_id: None,
            role: Some("overlord".to_string()),
            role_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::UnknownRole(_))));
}

#[tokio::test]
async fn duplicate_pending_invites_are_refused() {
    let org = standard_org().await;
    invite(&org.store, &org.owner, "x@acme.test", RoleName::Manager, "Acme").await;
    let result = invite_user(
        &org.store,
        &org.owner,
        &NewInvitation {
            email: "x@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            company_id: None,
            role: Some("basic".to_string()),
            role_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::AlreadyInvited)));
}

#[tokio::test]
async fn existing_users_cannot_be_reinvited() {
    let org = standard_org().await;
    let result = invite_user(
        &org.store,
        &org.owner,
        &NewInvitation {
            email: "a@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            company_id: None,
            role: Some("manager".to_string()),
            role_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::AlreadyRegistered)));

    // Refusal must leave the admin's organization edge intact.
    assert!(org
        .store
        .find_invitation("a@acme.test", Some(RoleName::Admin))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn activation_assigns_role_and_company() {
    let org = standard_org().await;
    let invitation = invite(
        &org.store,
        &org.owner,
        "sub@acme.test",
        RoleName::Subcontractor,
        "Acme",
    )
    .await;
    assert_eq!(invitation.token.len(), 48);

    let user = activate_invitation(&org.store, &invitation.token)
        .await
        .unwrap();
    assert_eq!(user.email, "sub@acme.test");
    assert_eq!(user.company_id, Some(org.company.id));
    let role = org
        .store
        .find_role_by_id(&user.role_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role.well_known(), Some(RoleName::Subcontractor));

    let accepted = org
        .store
        .find_invitation_by_id(&invitation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(accepted.accepted_at.is_some());
}

#[tokio::test]
async fn activation_is_single_use() {
    let org = standard_org().await;
    let invitation = invite(&org.store, &org.owner, "x@acme.test", RoleName::Basic, "Acme").await;
    activate_invitation(&org.store, &invitation.token)
        .await
        .unwrap();
    assert!(matches!(
        activate_invitation(&org.store, &invitation.token).await,
        Err(CoreError::AlreadyAccepted)
    ));
}

#[tokio::test]
async fn bad_tokens_are_rejected() {
    let org = standard_org().await;
    assert!(matches!(
        activate_invitation(&org.store, "no-such-token").await,
        Err(CoreError::InvalidToken)
    ));
}

#[tokio::test]
async fn expired_tokens_are_deleted_on_use() {
    let org = standard_org().await;
    org.store
        .create_invitation(&CreateInvitationParams {
            email: "late@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            role: Some("basic".to_string()),
            frontend_role: None,
            invited_by: org.owner.id,
            token: "expired-token".to_string(),
            expires_at: Utc::now() - Duration::days(1),
        })
        .await
        .unwrap();

    assert!(matches!(
        activate_invitation(&org.store, "expired-token").await,
        Err(CoreError::ExpiredToken)
    ));
    assert!(org
        .store
        .find_invitation_by_token("expired-token")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn expired_pending_invites_are_reissued_in_place() {
    let org = standard_org().await;
    let stale = org
        .store
        .create_invitation(&CreateInvitationParams {
            email: "slow@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            role: Some("basic".to_string()),
            frontend_role: None,
            invited_by: org.owner.id,
            token: "stale-token".to_string(),
            expires_at: Utc::now() - Duration::days(1),
        })
        .await
        .unwrap();

    let fresh = invite(&org.store, &org.owner, "slow@acme.test", RoleName::Basic, "Acme").await;
    assert_eq!(fresh.id, stale.id);
    assert_ne!(fresh.token, "stale-token");
    assert!(!fresh.is_expired(Utc::now()));
}

#[tokio::test]
async fn cancelling_is_for_the_inviter_or_privileged_users() {
    let org = standard_org().await;
    let worker =
        invite_and_activate(&org.store, &org.manager, "w@acme.test", RoleName::Basic, "Acme")
            .await;

    let invitation = invite(&org.store, &org.admin, "x@acme.test", RoleName::Basic, "Acme").await;
    assert!(matches!(
        cancel_invitation(&org.store, &worker, &invitation.id).await,
        Err(CoreError::Forbidden(_))
    ));

    // A super admin may cancel anyone's invitation.
    cancel_invitation(&org.store, &org.owner, &invitation.id)
        .await
        .unwrap();
    assert!(org
        .store
        .find_invitation_by_id(&invitation.id)
        .await
        .unwrap()
        .is_none());

    // The inviter may cancel their own.
    let invitation = invite(&org.store, &org.admin, "y@acme.test", RoleName::Basic, "Acme").await;
    cancel_invitation(&org.store, &org.admin, &invitation.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn accepted_invitations_cannot_be_cancelled() {
    let org = standard_org().await;
    let accepted = org
        .store
        .find_invitation("a@acme.test", None)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        cancel_invitation(&org.store, &org.owner, &accepted.id).await,
        Err(CoreError::AlreadyAccepted)
    ));
}
