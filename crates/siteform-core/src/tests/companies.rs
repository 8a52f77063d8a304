//! Company management gate tests.

use siteform_storage::*;

use crate::companies::{create_company, delete_company, set_company_status, NewCompany};
use crate::tests::common::*;
use crate::CoreError;

#[tokio::test]
async fn only_super_admins_manage_companies() {
    let org = standard_org().await;
    let result = create_company(
        &org.store,
        &org.admin,
        &NewCompany {
            name: "Shadow Co".to_string(),
            email: None,
            status: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::Forbidden(_))));

    assert!(matches!(
        set_company_status(&org.store, &org.admin, &org.company.id, EntityStatus::Suspended).await,
        Err(CoreError::Forbidden(_))
    ));
}

#[tokio::test]
async fn contact_emails_cannot_cross_organizations() {
    let store = test_store().await;
    let first = create_super_admin(&store, "one@x.test").await;
    let second = create_super_admin(&store, "two@x.test").await;

    create_company(
        &store,
        &first,
        &NewCompany {
            name: "First Co".to_string(),
            email: Some("shared@x.test".to_string()),
            status: None,
        },
    )
    .await
    .unwrap();

    let result = create_company(
        &store,
        &second,
        &NewCompany {
            name: "Second Co".to_string(),
            email: Some("shared@x.test".to_string()),
            status: None,
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn status_changes_cascade_to_the_company_users() {
    let org = standard_org().await;
    let company =
        set_company_status(&org.store, &org.owner, &org.company.id, EntityStatus::Suspended)
            .await
            .unwrap();
    assert_eq!(company.status, EntityStatus::Suspended);

    let admin = org
        .store
        .find_user_by_id(&org.admin.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.status, EntityStatus::Suspended);

    // The owner is outside the company and untouched.
    let owner = org
        .store
        .find_user_by_id(&org.owner.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.status, EntityStatus::Active);
}

#[tokio::test]
async fn deletion_is_reserved_for_the_creating_super_admin() {
    let org = standard_org().await;
    let other = create_super_admin(&org.store, "other@x.test").await;

    assert!(matches!(
        delete_company(&org.store, &other, &org.company.id).await,
        Err(CoreError::Forbidden(_))
    ));

    delete_company(&org.store, &org.owner, &org.company.id)
        .await
        .unwrap();
    assert!(org
        .store
        .find_company_by_id(&org.company.id)
        .await
        .unwrap()
        .is_none());
    // The company's users go with it; the owner survives.
    assert!(org
        .store
        .find_user_by_id(&org.admin.id)
        .await
        .unwrap()
        .is_none());
    assert!(org
        .store
        .find_user_by_id(&org.owner.id)
        .await
        .unwrap()
        .is_some());
}
