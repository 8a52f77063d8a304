//! Chain walk tests: every resolution path, plus the broken-chain and
//! fallback behavior.

use chrono::{Duration, Utc};
use siteform_storage::*;

use crate::resolver::{resolve_organization_owner, ResolutionPath};
use crate::tests::common::*;

#[tokio::test]
async fn super_admin_owns_their_own_organization() {
    let org = standard_org().await;
    let resolution = resolve_organization_owner(&org.store, &org.owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::SelfOwner);
}

#[tokio::test]
async fn admin_resolves_through_their_invitation() {
    let org = standard_org().await;
    let resolution = resolve_organization_owner(&org.store, &org.admin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::DirectInvite);
}

#[tokio::test]
async fn manager_resolves_via_the_admin_who_invited_them() {
    let org = standard_org().await;
    let resolution = resolve_organization_owner(&org.store, &org.manager)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::ViaAdmin);
}

#[tokio::test]
async fn leaf_walks_three_hops_through_the_manager() {
    let org = standard_org().await;
    let worker =
        invite_and_activate(&org.store, &org.manager, "w@acme.test", RoleName::Basic, "Acme")
            .await;
    let resolution = resolve_organization_owner(&org.store, &worker)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::ViaManager);
}

#[tokio::test]
async fn resolution_is_stable_across_calls() {
    let org = standard_org().await;
    let first = resolve_organization_owner(&org.store, &org.manager)
        .await
        .unwrap();
    let second = resolve_organization_owner(&org.store, &org.manager)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn manager_invited_by_manager_uses_company_fallback() {
    let org = standard_org().await;
    // The hierarchy forbids this edge; plant a legacy row directly.
    let manager_role = role_id(&org.store, "manager").await;
    let invitation = org
        .store
        .create_invitation(&CreateInvitationParams {
            email: "m2@acme.test".to_string(),
            name: None,
            company: Some("Acme".to_string()),
            role: Some("manager".to_string()),
            frontend_role: None,
            invited_by: org.manager.id,
            token: "legacy-manager-token".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();
    let second_manager = org
        .store
        .accept_invitation(&AcceptInvitationParams {
            invitation_id: invitation.id,
            role_id: manager_role,
            owner_role: false,
        })
        .await
        .unwrap();

    let resolution = resolve_organization_owner(&org.store, &second_manager)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::CompanyFallback);
}

#[tokio::test]
async fn company_created_by_an_admin_falls_back_one_more_hop() {
    let org = standard_org().await;
    // Legacy company row linked to the admin rather than the owner.
    let company = org
        .store
        .create_company(&CreateCompanyParams {
            name: "Acme Sub".to_string(),
            email: None,
            status: EntityStatus::Active,
            created_by_user_id: Some(org.admin.id),
        })
        .await
        .unwrap();
    let basic_role = role_id(&org.store, "user").await;
    let worker = org
        .store
        .create_user(&CreateUserParams {
            name: None,
            email: "w2@acme.test".to_string(),
            role_id: Some(basic_role),
            company_id: Some(company.id),
            status: EntityStatus::Active,
        })
        .await
        .unwrap();

    let resolution = resolve_organization_owner(&org.store, &worker)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolution.owner_id, org.owner.id);
    assert_eq!(resolution.path, ResolutionPath::CompanyFallback);
}

#[tokio::test]
async fn unlinked_user_resolves_to_nothing() {
    let store = test_store().await;
    let basic_role = role_id(&store, "user").await;
    let stray = store
        .create_user(&CreateUserParams {
            name: None,
            email: "stray@nowhere.test".to_string(),
            role_id: Some(basic_role),
            company_id: None,
            status: EntityStatus::Active,
        })
        .await
        .unwrap();
    assert!(resolve_organization_owner(&store, &stray)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn store_failures_propagate_instead_of_failing_open() {
    let mut store = MockStore::new();
    store
        .expect_find_role_by_id()
        .returning(|_| Err(StoreError::Backend("db down".to_string())));
    let user = User {
        id: UserId(uuid::Uuid::now_v7()),
        name: None,
        email: "x@acme.test".to_string(),
        role_id: Some(RoleId(uuid::Uuid::now_v7())),
        company_id: None,
        status: EntityStatus::Active,
        created_at: Utc::now(),
    };
    assert!(resolve_organization_owner(&store, &user).await.is_err());
}

#[tokio::test]
async fn broken_chain_never_yields_a_non_super_admin() {
    let org = standard_org().await;
    // Admin-role invitation issued by a manager: the walk must refuse the
    // manager as owner instead of returning it.
    let admin_role = role_id(&org.store, "admin").await;
    let invitation = org
        .store
        .create_invitation(&CreateInvitationParams {
            email: "orphan-admin@acme.test".to_string(),
            name: None,
            company: None,
            role: Some("admin".to_string()),
            frontend_role: None,
            invited_by: org.manager.id,
            token: "broken-chain-token".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();
    let orphan = org
        .store
        .accept_invitation(&AcceptInvitationParams {
            invitation_id: invitation.id,
            role_id: admin_role,
            owner_role: false,
        })
        .await
        .unwrap();

    // No company on the row either, so the fallback has nothing.
    assert!(resolve_organization_owner(&org.store, &orphan)
        .await
        .unwrap()
        .is_none());
}
