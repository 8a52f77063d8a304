//! Authorization gate tests: endpoint-level permission checks and
//! row-level visibility.

use siteform_storage::*;

use crate::authz::{can_delete_project, can_update_project, can_view, has_permission, has_role};
use crate::tests::common::*;

#[tokio::test]
async fn super_admin_holds_every_permission() {
    let org = standard_org().await;
    assert!(has_permission(&org.store, &org.owner, "invite_users", None)
        .await
        .unwrap());
    assert!(
        has_permission(&org.store, &org.owner, "anything_at_all", Some("anywhere"))
            .await
            .unwrap()
    );
    assert!(has_role(&org.store, &org.owner, RoleName::SuperAdmin)
        .await
        .unwrap());
}

#[tokio::test]
async fn named_scopes_must_match_or_be_full() {
    let store = test_store().await;
    let role = store
        .create_role(&CreateRoleParams {
            name: "granular".to_string(),
            permissions: vec![GrantedPermission {
                permission: "edit_project".to_string(),
                scope: PermissionScope::Named("projects".to_string()),
            }],
        })
        .await
        .unwrap();
    let user = store
        .create_user(&CreateUserParams {
            name: None,
            email: "granular@acme.test".to_string(),
            role_id: Some(role.id),
            company_id: None,
            status: EntityStatus::Active,
        })
        .await
        .unwrap();

    assert!(has_permission(&store, &user, "edit_project", Some("projects"))
        .await
        .unwrap());
    assert!(!has_permission(&store, &user, "edit_project", Some("tasks"))
        .await
        .unwrap());
    assert!(has_permission(&store, &user, "edit_project", None)
        .await
        .unwrap());
    assert!(!has_permission(&store, &user, "delete_project", None)
        .await
        .unwrap());
}

#[tokio::test]
async fn a_user_without_a_role_has_no_permissions() {
    let store = test_store().await;
    let user = store
        .create_user(&CreateUserParams {
            name: None,
            email: "roleless@acme.test".to_string(),
            role_id: None,
            company_id: None,
            status: EntityStatus::Active,
        })
        .await
        .unwrap();
    assert!(!has_permission(&store, &user, "invite_users", None)
        .await
        .unwrap());
    assert!(!has_role(&store, &user, RoleName::Basic).await.unwrap());
}

#[tokio::test]
async fn view_follows_the_resolved_organization() {
    let org = standard_org().await;
    let worker =
        invite_and_activate(&org.store, &org.manager, "w@acme.test", RoleName::Basic, "Acme")
            .await;
    let project = create_project(&org.store, "HQ", &org.owner).await;

    // Same resolved owner as the creator, even with no shared company.
    assert!(can_view(&org.store, &worker, &project).await.unwrap());

    // A whole different organization sees nothing.
    let rival_owner = create_super_admin(&org.store, "r@rival.test").await;
    create_company_for(&org.store, &rival_owner, "Rival").await;
    let rival_admin = invite_and_activate(
        &org.store,
        &rival_owner,
        "ra@rival.test",
        RoleName::Admin,
        "Rival",
    )
    .await;
    assert!(!can_view(&org.store, &rival_admin, &project).await.unwrap());
}

#[tokio::test]
async fn site_team_membership_grants_view() {
    let org = standard_org().await;
    let project = create_project(&org.store, "HQ", &org.admin).await;

    let basic_role = role_id(&org.store, "user").await;
    let stray = org
        .store
        .create_user(&CreateUserParams {
            name: None,
            email: "stray@nowhere.test".to_string(),
            role_id: Some(basic_role),
            company_id: None,
            status: EntityStatus::Active,
        })
        .await
        .unwrap();
    assert!(!can_view(&org.store, &stray, &project).await.unwrap());

    org.store
        .add_site_team_member(&AddSiteTeamParams {
            project_id: project.id,
            user_id: stray.id,
            role: Some("inspector".to_string()),
            created_by: Some(org.admin.id),
        })
        .await
        .unwrap();
    assert!(can_view(&org.store, &stray, &project).await.unwrap());
}

#[tokio::test]
async fn update_rights_stop_at_the_manager_rung() {
    let org = standard_org().await;
    let worker =
        invite_and_activate(&org.store, &org.manager, "w@acme.test", RoleName::Basic, "Acme")
            .await;
    let project = create_project(&org.store, "Site cabin", &worker).await;

    // Creator may always update.
    assert!(can_update_project(&org.store, &worker, &project)
        .await
        .unwrap());
    // An admin in the creator's company may update and delete.
    assert!(can_update_project(&org.store, &org.admin, &project)
        .await
        .unwrap());
    assert!(can_delete_project(&org.store, &org.admin, &project)
        .await
        .unwrap());
    // A manager may not, even in the same company.
    assert!(!can_update_project(&org.store, &org.manager, &project)
        .await
        .unwrap());
    assert!(!can_delete_project(&org.store, &org.manager, &project)
        .await
        .unwrap());
}
