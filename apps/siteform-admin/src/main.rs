//! Administration CLI for the siteform organization engine.
//!
//! Thin wrappers over `siteform-core`: every command loads the acting user
//! by email and delegates to the same primitives the backend services use,
//! so what this tool prints is exactly what the engine would decide.

use clap::{Parser, Subcommand};
use serde_json::json;
use uuid::Uuid;

use siteform_core::companies::{self, NewCompany};
use siteform_core::invitations::{self, NewInvitation};
use siteform_core::membership;
use siteform_core::resolver::resolve_organization_owner;
use siteform_core::scope::{compute_scope, visible_projects};
use siteform_storage::{
    Company, CompanyId, CreateRoleParams, CreateUserParams, EntityStatus, GrantedPermission,
    Invitation, InvitationId, PermissionScope, Project, RoleName, Store, User,
};
use siteform_store_sqlite::SqliteStore;

type CliError = Box<dyn std::error::Error>;

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "siteform-admin")]
#[command(about = "Siteform admin CLI: roles, invitations, companies and scope inspection")]
struct Cli {
    /// Database URL (sqlite://path/to/store.db); defaults to ~/.siteform/store.db
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the well-known roles and their permission grants
    InitRoles,
    /// Create a super admin user (an organization root)
    CreateSuperAdmin {
        /// Email of the new super admin
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Invitation management commands
    Invite {
        #[command(subcommand)]
        invite_cmd: InviteCommand,
    },
    /// Company management commands
    Company {
        #[command(subcommand)]
        company_cmd: CompanyCommand,
    },
    /// Resolve the organization owner of a user
    ResolveOwner {
        /// Email of the user to resolve
        email: String,
    },
    /// Show the company and admin scope of a user's organization
    Scope {
        /// Email of any user in the organization
        email: String,
    },
    /// List organization users visible to a user, pending invites included
    Users {
        /// Email of the acting user
        email: String,
    },
    /// Organization dashboard of a super admin
    Dashboard {
        /// Email of the super admin
        email: String,
    },
    /// List the projects visible to a user
    Projects {
        /// Email of the acting user
        email: String,
    },
}

#[derive(Subcommand)]
enum InviteCommand {
    /// Create an invitation on behalf of a user
    Create {
        /// Email of the inviting user
        #[arg(long)]
        by: String,
        /// Email of the invitee
        #[arg(long)]
        email: String,
        /// Display name of the invitee
        #[arg(long)]
        name: Option<String>,
        /// Company the invitee will belong to
        #[arg(long)]
        company: Option<String>,
        /// Role to grant on acceptance
        #[arg(long)]
        role: String,
    },
    /// Show which roles a user may invite
    Roles {
        /// Email of the user
        email: String,
    },
    /// List invitations issued by a user
    List {
        /// Email of the inviter
        email: String,
        /// Only pending invitations
        #[arg(long)]
        pending: bool,
    },
    /// Activate an invitation by its one-time token
    Activate {
        /// Activation token
        token: String,
    },
    /// Cancel a pending invitation on behalf of a user
    Cancel {
        /// Email of the acting user
        #[arg(long)]
        by: String,
        /// Invitation id
        id: String,
    },
}

#[derive(Subcommand)]
enum CompanyCommand {
    /// Create a company owned by the acting super admin
    Create {
        /// Email of the acting super admin
        #[arg(long)]
        by: String,
        /// Company name
        #[arg(long)]
        name: String,
        /// Contact email; defaults to the acting user's
        #[arg(long)]
        email: Option<String>,
    },
    /// Set a company's status (cascades to its users)
    Status {
        /// Email of the acting super admin
        #[arg(long)]
        by: String,
        /// Company id
        id: String,
        /// New status: active, inactive or suspended
        status: String,
    },
    /// Delete a company together with its non-super-admin users
    Delete {
        /// Email of the acting super admin
        #[arg(long)]
        by: String,
        /// Company id
        id: String,
    },
}

// ────────────────────────────────────── Helpers ──────────────────────────────────────

async fn open_store(database_url: Option<String>) -> Result<SqliteStore, CliError> {
    match database_url {
        Some(url) => Ok(SqliteStore::open(&url).await?),
        None => Ok(SqliteStore::open_default().await?),
    }
}

async fn require_user(store: &dyn Store, email: &str) -> Result<User, CliError> {
    store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| format!("no user with email {email}").into())
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn user_json(user: &User) -> serde_json::Value {
    json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
        "role_id": user.role_id.map(|id| id.to_string()),
        "company_id": user.company_id.map(|id| id.to_string()),
        "status": user.status,
        "created_at": user.created_at.to_rfc3339(),
    })
}

fn invitation_json(invitation: &Invitation) -> serde_json::Value {
    json!({
        "id": invitation.id.to_string(),
        "email": invitation.email,
        "name": invitation.name,
        "company": invitation.company,
        "role": invitation.role,
        "invited_by": invitation.invited_by.to_string(),
        "token": invitation.token,
        "expires_at": invitation.expires_at.to_rfc3339(),
        "accepted_at": invitation.accepted_at.map(|at| at.to_rfc3339()),
        "created_at": invitation.created_at.to_rfc3339(),
    })
}

fn company_json(company: &Company) -> serde_json::Value {
    json!({
        "id": company.id.to_string(),
        "name": company.name,
        "email": company.email,
        "status": company.status,
        "created_by_user_id": company.created_by_user_id.map(|id| id.to_string()),
        "activated_at": company.activated_at.map(|at| at.to_rfc3339()),
        "suspended_at": company.suspended_at.map(|at| at.to_rfc3339()),
        "created_at": company.created_at.to_rfc3339(),
    })
}

fn project_json(project: &Project) -> serde_json::Value {
    json!({
        "id": project.id.to_string(),
        "title": project.title,
        "created_by": project.created_by.to_string(),
        "assigned_admin_id": project.assigned_admin_id.map(|id| id.to_string()),
        "assigned_manager_id": project.assigned_manager_id.map(|id| id.to_string()),
        "created_at": project.created_at.to_rfc3339(),
    })
}

// ────────────────────────────────────── Commands ──────────────────────────────────────

/// The well-known roles and the permissions each is seeded with. Only the
/// middle rungs get `invite_users`; super_admin is recognized by role, not
/// by permission rows.
const ROLE_SEED: &[(RoleName, &[&str])] = &[
    (RoleName::SuperAdmin, &[]),
    (RoleName::Admin, &["invite_users"]),
    (RoleName::Manager, &["invite_users"]),
    (RoleName::Subcontractor, &["invite_users"]),
    (RoleName::Basic, &[]),
    (RoleName::DesignTeam, &[]),
];

async fn cmd_init_roles(store: &dyn Store) -> Result<(), CliError> {
    for (role, permissions) in ROLE_SEED {
        if store.find_role_by_name(role.as_str()).await?.is_some() {
            println!("role {} already present", role.as_str());
            continue;
        }
        store
            .create_role(&CreateRoleParams {
                name: role.as_str().to_string(),
                permissions: permissions
                    .iter()
                    .map(|permission| GrantedPermission {
                        permission: permission.to_string(),
                        scope: PermissionScope::Full,
                    })
                    .collect(),
            })
            .await?;
        println!("created role {}", role.as_str());
    }
    Ok(())
}

async fn cmd_create_super_admin(
    store: &dyn Store,
    email: &str,
    name: Option<String>,
) -> Result<(), CliError> {
    let role = store
        .find_role_by_name(RoleName::SuperAdmin.as_str())
        .await?
        .ok_or("super_admin role missing; run init-roles first")?;
    let user = store
        .create_user(&CreateUserParams {
            name,
            email: email.to_string(),
            role_id: Some(role.id),
            company_id: None,
            status: EntityStatus::Active,
        })
        .await?;
    tracing::info!(user = %user.id, "super admin created");
    print_json(&user_json(&user))
}

async fn cmd_invite_create(
    store: &dyn Store,
    by: &str,
    request: &NewInvitation,
) -> Result<(), CliError> {
    let acting = require_user(store, by).await?;
    let invitation = invitations::invite_user(store, &acting, request).await?;
    print_json(&invitation_json(&invitation))
}

async fn cmd_invite_roles(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let user = require_user(store, email).await?;
    let roles: Vec<&str> = invitations::available_invite_roles(store, &user)
        .await?
        .iter()
        .map(RoleName::as_str)
        .collect();
    print_json(&json!(roles))
}

async fn cmd_invite_list(store: &dyn Store, email: &str, pending: bool) -> Result<(), CliError> {
    let user = require_user(store, email).await?;
    let invitations = store
        .list_invitations_by_inviter(&user.id, None, pending)
        .await?;
    let rows: Vec<serde_json::Value> = invitations.iter().map(invitation_json).collect();
    print_json(&json!(rows))
}

async fn cmd_invite_activate(store: &dyn Store, token: &str) -> Result<(), CliError> {
    let user = invitations::activate_invitation(store, token).await?;
    print_json(&user_json(&user))
}

async fn cmd_invite_cancel(store: &dyn Store, by: &str, id: &str) -> Result<(), CliError> {
    let acting = require_user(store, by).await?;
    let invitation_id = InvitationId(id.parse::<Uuid>()?);
    invitations::cancel_invitation(store, &acting, &invitation_id).await?;
    println!("invitation {id} cancelled");
    Ok(())
}

async fn cmd_resolve_owner(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let user = require_user(store, email).await?;
    match resolve_organization_owner(store, &user).await? {
        Some(resolution) => {
            let owner = store.find_user_by_id(&resolution.owner_id).await?;
            print_json(&json!({
                "resolved": true,
                "owner_id": resolution.owner_id.to_string(),
                "owner_email": owner.map(|u| u.email),
                "path": format!("{:?}", resolution.path),
            }))
        }
        None => print_json(&json!({ "resolved": false })),
    }
}

async fn cmd_scope(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let user = require_user(store, email).await?;
    let Some(resolution) = resolve_organization_owner(store, &user).await? else {
        return print_json(&json!({ "resolved": false }));
    };
    let scope = compute_scope(store, &resolution.owner_id).await?;
    print_json(&json!({
        "owner_id": scope.owner_id.to_string(),
        "company_ids": scope.company_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
        "company_names": scope.company_names,
        "admin_user_ids": scope.admin_user_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
    }))
}

async fn cmd_users(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let acting = require_user(store, email).await?;
    let entries = membership::list_organization_users(store, &acting).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

async fn cmd_dashboard(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let acting = require_user(store, email).await?;
    let dashboard = membership::organization_dashboard(store, &acting).await?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

async fn cmd_projects(store: &dyn Store, email: &str) -> Result<(), CliError> {
    let acting = require_user(store, email).await?;
    let projects = visible_projects(store, &acting).await?;
    let rows: Vec<serde_json::Value> = projects.iter().map(project_json).collect();
    print_json(&json!(rows))
}

async fn cmd_company_create(
    store: &dyn Store,
    by: &str,
    request: &NewCompany,
) -> Result<(), CliError> {
    let acting = require_user(store, by).await?;
    let company = companies::create_company(store, &acting, request).await?;
    print_json(&company_json(&company))
}

async fn cmd_company_status(
    store: &dyn Store,
    by: &str,
    id: &str,
    status: &str,
) -> Result<(), CliError> {
    let acting = require_user(store, by).await?;
    let company_id = CompanyId(id.parse::<Uuid>()?);
    let status: EntityStatus = status.parse()?;
    let company = companies::set_company_status(store, &acting, &company_id, status).await?;
    print_json(&company_json(&company))
}

async fn cmd_company_delete(store: &dyn Store, by: &str, id: &str) -> Result<(), CliError> {
    let acting = require_user(store, by).await?;
    let company_id = CompanyId(id.parse::<Uuid>()?);
    companies::delete_company(store, &acting, &company_id).await?;
    println!("company {id} deleted");
    Ok(())
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = open_store(cli.database_url).await?;

    match cli.command {
        Command::InitRoles => cmd_init_roles(&store).await?,
        Command::CreateSuperAdmin { email, name } => {
            cmd_create_super_admin(&store, &email, name).await?;
        }
        Command::Invite { invite_cmd } => match invite_cmd {
            InviteCommand::Create {
                by,
                email,
                name,
                company,
                role,
            } => {
                let request = NewInvitation {
                    email,
                    name,
                    company,
                    company_id: None,
                    role: Some(role),
                    role_id: None,
                };
                cmd_invite_create(&store, &by, &request).await?;
            }
            InviteCommand::Roles { email } => cmd_invite_roles(&store, &email).await?,
            InviteCommand::List { email, pending } => {
                cmd_invite_list(&store, &email, pending).await?;
            }
            InviteCommand::Activate { token } => cmd_invite_activate(&store, &token).await?,
            InviteCommand::Cancel { by, id } => cmd_invite_cancel(&store, &by, &id).await?,
        },
        Command::Company { company_cmd } => match company_cmd {
            CompanyCommand::Create { by, name, email } => {
                let request = NewCompany {
                    name,
                    email,
                    status: None,
                };
                cmd_company_create(&store, &by, &request).await?;
            }
            CompanyCommand::Status { by, id, status } => {
                cmd_company_status(&store, &by, &id, &status).await?;
            }
            CompanyCommand::Delete { by, id } => cmd_company_delete(&store, &by, &id).await?,
        },
        Command::ResolveOwner { email } => cmd_resolve_owner(&store, &email).await?,
        Command::Scope { email } => cmd_scope(&store, &email).await?,
        Command::Users { email } => cmd_users(&store, &email).await?,
        Command::Dashboard { email } => cmd_dashboard(&store, &email).await?,
        Command::Projects { email } => cmd_projects(&store, &email).await?,
    }

    Ok(())
}
