//! Shared test fixtures.
//!
//! `standard_org` is the worked example used throughout: a super admin
//! owning one company, with an admin invited by the super admin and a
//! manager invited by that admin.

use siteform_storage::*;
use siteform_store_sqlite::SqliteStore;

use crate::companies::{self, NewCompany};
use crate::invitations::{self, NewInvitation};

/// In-memory store with the well-known roles seeded. The basic role is
/// seeded under its legacy stored name `user`, as in production data.
pub async fn test_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed_roles(&store).await;
    store
}

fn full(permission: &str) -> GrantedPermission {
    GrantedPermission {
        permission: permission.to_string(),
        scope: PermissionScope::Full,
    }
}

async fn seed_roles(store: &SqliteStore) {
    for (name, permissions) in [
        ("super_admin", vec![]),
        ("admin", vec![full("invite_users")]),
        ("manager", vec![full("invite_users")]),
        ("subcontractor", vec![full("invite_users")]),
        ("user", vec![]),
    ] {
        store
            .create_role(&CreateRoleParams {
                name: name.to_string(),
                permissions,
            })
            .await
            .unwrap();
    }
}

pub async fn role_id(store: &SqliteStore, name: &str) -> RoleId {
    store.find_role_by_name(name).await.unwrap().unwrap().id
}

/// Super admins are never invited; bootstrap the row directly.
pub async fn create_super_admin(store: &SqliteStore, email: &str) -> User {
    let role = role_id(store, "super_admin").await;
    store
        .create_user(&CreateUserParams {
            name: None,
            email: email.to_string(),
            role_id: Some(role),
            company_id: None,
            status: EntityStatus::Active,
        })
        .await
        .unwrap()
}

pub async fn create_company_for(store: &SqliteStore, owner: &User, name: &str) -> Company {
    companies::create_company(
        store,
        owner,
        &NewCompany {
            name: name.to_string(),
            email: None,
            status: None,
        },
    )
    .await
    .unwrap()
}

pub async fn invite(
    store: &SqliteStore,
    inviter: &User,
    email: &str,
    role: RoleName,
    company: &str,
) -> Invitation {
    invitations::invite_user(
        store,
        inviter,
        &NewInvitation {
            email: email.to_string(),
            name: None,
            company: Some(company.to_string()),
            company_id: None,
            role: Some(role.as_str().to_string()),
            role_id: None,
        },
    )
    .await
    .unwrap()
}

/// Invite `email` into `company` with `role` and immediately activate.
pub async fn invite_and_activate(
    store: &SqliteStore,
    inviter: &User,
    email: &str,
    role: RoleName,
    company: &str,
) -> User {
    let invitation = invite(store, inviter, email, role, company).await;
    invitations::activate_invitation(store, &invitation.token)
        .await
        .unwrap()
}

pub async fn create_project(store: &SqliteStore, title: &str, creator: &User) -> Project {
    store
        .create_project(&CreateProjectParams {
            title: title.to_string(),
            created_by: creator.id,
            assigned_admin_id: None,
            assigned_manager_id: None,
        })
        .await
        .unwrap()
}

pub struct Org {
    pub store: SqliteStore,
    pub owner: User,
    pub company: Company,
    pub admin: User,
    pub manager: User,
}

/// super admin S → company "Acme"; S invites admin A; A invites manager M.
pub async fn standard_org() -> Org {
    let store = test_store().await;
    let owner = create_super_admin(&store, "s@acme.test").await;
    let company = create_company_for(&store, &owner, "Acme").await;
    let admin = invite_and_activate(&store, &owner, "a@acme.test", RoleName::Admin, "Acme").await;
    let manager =
        invite_and_activate(&store, &admin, "m@acme.test", RoleName::Manager, "Acme").await;
    Org {
        store,
        owner,
        company,
        admin,
        manager,
    }
}
