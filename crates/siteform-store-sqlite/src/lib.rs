//! SQLite backend for the siteform [`Store`] trait.
//!
//! UUIDs are stored as text, timestamps as unix seconds. The multi-row
//! mutations (`accept_invitation`, `set_company_status`, `delete_company`)
//! run inside a single transaction.

use chrono::{DateTime, Utc};
use siteform_storage::{
    AcceptInvitationParams, AddSiteTeamParams, Company, CompanyId, CreateCompanyParams,
    CreateInvitationParams, CreateProjectParams, CreateRoleParams, CreateUserParams, EntityStatus,
    GrantedPermission, Invitation, InvitationId, PermissionScope, Project, ProjectFilter,
    ProjectId, Role, RoleId, RoleName, SiteTeamId, SiteTeamMember, Store, StoreError, User,
    UserId,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const USER_COLS: &str = "id,name,email,role_id,company_id,status,created_at";
const ROLE_COLS: &str = "id,name,created_at";
const COMPANY_COLS: &str =
    "id,name,email,status,created_by_user_id,activated_at,suspended_at,created_at";
const INVITATION_COLS: &str =
    "id,email,name,company,role,frontend_role,invited_by,token,expires_at,accepted_at,created_at";
const PROJECT_COLS: &str = "id,title,created_by,assigned_admin_id,assigned_manager_id,created_at";
const SITE_TEAM_COLS: &str = "id,project_id,user_id,role,created_by,created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.siteform/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".siteform");
        std::fs::create_dir_all(&dir).map_err(backend)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(backend)?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }
}

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// INSERT error mapping: UNIQUE violations become `AlreadyExists`.
fn insert_err(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn parse_id(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend)
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Lowercased raw spellings a role name lookup must match, alias-aware.
fn role_name_candidates(name: &str) -> Vec<String> {
    match name.parse::<RoleName>() {
        Ok(known) => known.aliases().iter().map(|a| a.to_string()).collect(),
        Err(_) => vec![name.to_ascii_lowercase()],
    }
}

type RoleRow = (String, String, i64);
type UserRow = (
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    String,
    i64,
);
type CompanyRow = (
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<i64>,
    Option<i64>,
    i64,
);
type ProjectRow = (String, String, String, Option<String>, Option<String>, i64);
type SiteTeamRow = (String, String, String, Option<String>, Option<String>, i64);

#[derive(sqlx::FromRow)]
struct InvitationRow {
    id: String,
    email: String,
    name: Option<String>,
    company: Option<String>,
    role: Option<String>,
    frontend_role: Option<String>,
    invited_by: String,
    token: String,
    expires_at: i64,
    accepted_at: Option<i64>,
    created_at: i64,
}

fn role_from(row: RoleRow) -> Result<Role, StoreError> {
    Ok(Role {
        id: RoleId(parse_id(&row.0)?),
        name: row.1,
        created_at: from_ts(row.2),
    })
}

fn user_from(row: UserRow) -> Result<User, StoreError> {
    let (id, name, email, role_id, company_id, status, created_at) = row;
    Ok(User {
        id: UserId(parse_id(&id)?),
        name,
        email,
        role_id: role_id.as_deref().map(parse_id).transpose()?.map(RoleId),
        company_id: company_id
            .as_deref()
            .map(parse_id)
            .transpose()?
            .map(CompanyId),
        status: status.parse().map_err(backend)?,
        created_at: from_ts(created_at),
    })
}

fn company_from(row: CompanyRow) -> Result<Company, StoreError> {
    let (id, name, email, status, created_by, activated_at, suspended_at, created_at) = row;
    Ok(Company {
        id: CompanyId(parse_id(&id)?),
        name,
        email,
        status: status.parse().map_err(backend)?,
        created_by_user_id: created_by.as_deref().map(parse_id).transpose()?.map(UserId),
        activated_at: activated_at.map(from_ts),
        suspended_at: suspended_at.map(from_ts),
        created_at: from_ts(created_at),
    })
}

fn invitation_from(row: InvitationRow) -> Result<Invitation, StoreError> {
    Ok(Invitation {
        id: InvitationId(parse_id(&row.id)?),
        email: row.email,
        name: row.name,
        company: row.company,
        role: row.role,
        frontend_role: row.frontend_role,
        invited_by: UserId(parse_id(&row.invited_by)?),
        token: row.token,
        expires_at: from_ts(row.expires_at),
        accepted_at: row.accepted_at.map(from_ts),
        created_at: from_ts(row.created_at),
    })
}

fn project_from(row: ProjectRow) -> Result<Project, StoreError> {
    let (id, title, created_by, admin, manager, created_at) = row;
    Ok(Project {
        id: ProjectId(parse_id(&id)?),
        title,
        created_by: UserId(parse_id(&created_by)?),
        assigned_admin_id: admin.as_deref().map(parse_id).transpose()?.map(UserId),
        assigned_manager_id: manager.as_deref().map(parse_id).transpose()?.map(UserId),
        created_at: from_ts(created_at),
    })
}

fn site_team_from(row: SiteTeamRow) -> Result<SiteTeamMember, StoreError> {
    let (id, project_id, user_id, role, created_by, created_at) = row;
    Ok(SiteTeamMember {
        id: SiteTeamId(parse_id(&id)?),
        project_id: ProjectId(parse_id(&project_id)?),
        user_id: UserId(parse_id(&user_id)?),
        role,
        created_by: created_by.as_deref().map(parse_id).transpose()?.map(UserId),
        created_at: from_ts(created_at),
    })
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────────── Users ──────────────────────────────

    async fn create_user(&self, params: &CreateUserParams) -> Result<User, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        sqlx::query(&format!("INSERT INTO users({USER_COLS}) VALUES(?,?,?,?,?,?,?)"))
            .bind(&id)
            .bind(params.name.as_deref())
            .bind(&params.email)
            .bind(params.role_id.map(|r| r.to_string()))
            .bind(params.company_id.map(|c| c.to_string()))
            .bind(params.status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(insert_err)?;
        Ok(User {
            id: UserId(parse_id(&id)?),
            name: params.name.clone(),
            email: params.email.clone(),
            role_id: params.role_id,
            company_id: params.company_id,
            status: params.status,
            created_at: from_ts(now),
        })
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLS} FROM users WHERE id=?"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(user_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLS} FROM users WHERE email=?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(user_from).transpose()
    }

    async fn find_users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {USER_COLS} FROM users WHERE email IN ({}) ORDER BY created_at, rowid",
            placeholders(emails.len())
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for email in emails {
            query = query.bind(email);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(user_from).collect()
    }

    async fn find_users_by_role_and_companies(
        &self,
        role_id: &RoleId,
        company_ids: &[CompanyId],
    ) -> Result<Vec<User>, StoreError> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {USER_COLS} FROM users WHERE role_id=? AND company_id IN ({}) \
             ORDER BY created_at, rowid",
            placeholders(company_ids.len())
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql).bind(role_id.to_string());
        for id in company_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(user_from).collect()
    }

    async fn list_users_in_companies(
        &self,
        company_ids: &[CompanyId],
    ) -> Result<Vec<User>, StoreError> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {USER_COLS} FROM users WHERE company_id IN ({}) ORDER BY created_at, rowid",
            placeholders(company_ids.len())
        );
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for id in company_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(user_from).collect()
    }

    async fn update_user_status(
        &self,
        user_id: &UserId,
        status: EntityStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET status=? WHERE id=?")
            .bind(status.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────────── Roles ──────────────────────────────

    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        sqlx::query("INSERT INTO roles(id,name,created_at) VALUES(?,?,?)")
            .bind(&id)
            .bind(&params.name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(insert_err)?;
        for grant in &params.permissions {
            sqlx::query("INSERT INTO role_permissions(role_id,permission,scope) VALUES(?,?,?)")
                .bind(&id)
                .bind(&grant.permission)
                .bind(grant.scope.as_str())
                .execute(&mut *tx)
                .await
                .map_err(insert_err)?;
        }
        tx.commit().await.map_err(backend)?;
        Ok(Role {
            id: RoleId(parse_id(&id)?),
            name: params.name.clone(),
            created_at: from_ts(now),
        })
    }

    async fn find_role_by_id(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLS} FROM roles WHERE id=?"
        ))
        .bind(role_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(role_from).transpose()
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let candidates = role_name_candidates(name);
        let sql = format!(
            "SELECT {ROLE_COLS} FROM roles WHERE lower(name) IN ({}) LIMIT 1",
            placeholders(candidates.len())
        );
        let mut query = sqlx::query_as::<_, RoleRow>(&sql);
        for candidate in &candidates {
            query = query.bind(candidate);
        }
        let row = query.fetch_optional(&self.pool).await.map_err(backend)?;
        row.map(role_from).transpose()
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLS} FROM roles ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(role_from).collect()
    }

    async fn role_permissions(
        &self,
        role_id: &RoleId,
    ) -> Result<Vec<GrantedPermission>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT permission,scope FROM role_permissions WHERE role_id=? ORDER BY permission",
        )
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|(permission, scope)| GrantedPermission {
                permission,
                scope: PermissionScope::parse(&scope),
            })
            .collect())
    }

    // ─────────────────────────────── Companies ────────────────────────────

    async fn create_company(&self, params: &CreateCompanyParams) -> Result<Company, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        let activated_at = (params.status == EntityStatus::Active).then_some(now);
        sqlx::query(&format!(
            "INSERT INTO companies({COMPANY_COLS}) VALUES(?,?,?,?,?,?,NULL,?)"
        ))
        .bind(&id)
        .bind(&params.name)
        .bind(params.email.as_deref())
        .bind(params.status.as_str())
        .bind(params.created_by_user_id.map(|u| u.to_string()))
        .bind(activated_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(Company {
            id: CompanyId(parse_id(&id)?),
            name: params.name.clone(),
            email: params.email.clone(),
            status: params.status,
            created_by_user_id: params.created_by_user_id,
            activated_at: activated_at.map(from_ts),
            suspended_at: None,
            created_at: from_ts(now),
        })
    }

    async fn find_company_by_id(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE id=?"
        ))
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(company_from).transpose()
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE name=?"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(company_from).transpose()
    }

    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE email=? ORDER BY created_at, rowid LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(company_from).transpose()
    }

    async fn find_companies_by_creator(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Company>, StoreError> {
        let rows = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE created_by_user_id=? \
             ORDER BY created_at, rowid"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(company_from).collect()
    }

    async fn set_company_status(
        &self,
        company_id: &CompanyId,
        status: EntityStatus,
    ) -> Result<Company, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let now = Utc::now().timestamp();
        let id = company_id.to_string();

        let result = match status {
            EntityStatus::Active => {
                sqlx::query(
                    "UPDATE companies SET status='active', activated_at=?, suspended_at=NULL \
                     WHERE id=?",
                )
                .bind(now)
                .bind(&id)
            }
            EntityStatus::Suspended => {
                sqlx::query("UPDATE companies SET status='suspended', suspended_at=? WHERE id=?")
                    .bind(now)
                    .bind(&id)
            }
            EntityStatus::Inactive => {
                sqlx::query("UPDATE companies SET status='inactive' WHERE id=?").bind(&id)
            }
        }
        .execute(&mut *tx)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        // Cascade to the company's users; super admins are never touched.
        sqlx::query(
            "UPDATE users SET status=? WHERE company_id=? AND (role_id IS NULL OR role_id NOT IN \
             (SELECT id FROM roles WHERE lower(name)='super_admin'))",
        )
        .bind(status.as_str())
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "SELECT {COMPANY_COLS} FROM companies WHERE id=?"
        ))
        .bind(&id)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        company_from(row)
    }

    async fn delete_company(&self, company_id: &CompanyId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let id = company_id.to_string();

        sqlx::query(
            "DELETE FROM users WHERE company_id=? AND (role_id IS NULL OR role_id NOT IN \
             (SELECT id FROM roles WHERE lower(name)='super_admin'))",
        )
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let result = sqlx::query("DELETE FROM companies WHERE id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    // ────────────────────────────── Invitations ───────────────────────────

    async fn create_invitation(
        &self,
        params: &CreateInvitationParams,
    ) -> Result<Invitation, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        sqlx::query(&format!(
            "INSERT INTO invitations({INVITATION_COLS}) VALUES(?,?,?,?,?,?,?,?,?,NULL,?)"
        ))
        .bind(&id)
        .bind(&params.email)
        .bind(params.name.as_deref())
        .bind(params.company.as_deref())
        .bind(params.role.as_deref())
        .bind(params.frontend_role.as_deref())
        .bind(params.invited_by.to_string())
        .bind(&params.token)
        .bind(params.expires_at.timestamp())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(Invitation {
            id: InvitationId(parse_id(&id)?),
            email: params.email.clone(),
            name: params.name.clone(),
            company: params.company.clone(),
            role: params.role.clone(),
            frontend_role: params.frontend_role.clone(),
            invited_by: params.invited_by,
            token: params.token.clone(),
            expires_at: from_ts(params.expires_at.timestamp()),
            accepted_at: None,
            created_at: from_ts(now),
        })
    }

    async fn refresh_invitation(
        &self,
        invitation_id: &InvitationId,
        params: &CreateInvitationParams,
    ) -> Result<Invitation, StoreError> {
        let result = sqlx::query(
            "UPDATE invitations SET name=?, company=?, role=?, frontend_role=?, invited_by=?, \
             token=?, expires_at=?, accepted_at=NULL WHERE id=?",
        )
        .bind(params.name.as_deref())
        .bind(params.company.as_deref())
        .bind(params.role.as_deref())
        .bind(params.frontend_role.as_deref())
        .bind(params.invited_by.to_string())
        .bind(&params.token)
        .bind(params.expires_at.timestamp())
        .bind(invitation_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_invitation_by_id(invitation_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_invitation(
        &self,
        email: &str,
        role: Option<RoleName>,
    ) -> Result<Option<Invitation>, StoreError> {
        let mut sql = format!("SELECT {INVITATION_COLS} FROM invitations WHERE email=?");
        let candidates = role.map(|r| role_name_candidates(r.as_str()));
        if let Some(candidates) = &candidates {
            let ph = placeholders(candidates.len());
            sql.push_str(&format!(
                " AND (lower(role) IN ({ph}) OR lower(frontend_role) IN ({ph}))"
            ));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT 1");

        let mut query = sqlx::query_as::<_, InvitationRow>(&sql).bind(email);
        if let Some(candidates) = &candidates {
            for candidate in candidates.iter().chain(candidates.iter()) {
                query = query.bind(candidate);
            }
        }
        let row = query.fetch_optional(&self.pool).await.map_err(backend)?;
        row.map(invitation_from).transpose()
    }

    async fn find_invitation_by_id(
        &self,
        invitation_id: &InvitationId,
    ) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLS} FROM invitations WHERE id=?"
        ))
        .bind(invitation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(invitation_from).transpose()
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLS} FROM invitations WHERE token=?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(invitation_from).transpose()
    }

    async fn list_invitations_by_inviter(
        &self,
        inviter: &UserId,
        role: Option<RoleName>,
        pending_only: bool,
    ) -> Result<Vec<Invitation>, StoreError> {
        let mut sql = format!("SELECT {INVITATION_COLS} FROM invitations WHERE invited_by=?");
        let candidates = role.map(|r| role_name_candidates(r.as_str()));
        if let Some(candidates) = &candidates {
            let ph = placeholders(candidates.len());
            sql.push_str(&format!(
                " AND (lower(role) IN ({ph}) OR lower(frontend_role) IN ({ph}))"
            ));
        }
        if pending_only {
            sql.push_str(" AND accepted_at IS NULL");
        }
        sql.push_str(" ORDER BY created_at, rowid");

        let mut query = sqlx::query_as::<_, InvitationRow>(&sql).bind(inviter.to_string());
        if let Some(candidates) = &candidates {
            for candidate in candidates.iter().chain(candidates.iter()) {
                query = query.bind(candidate);
            }
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(invitation_from).collect()
    }

    async fn list_pending_invitations(
        &self,
        inviter: &UserId,
        company_names: &[String],
    ) -> Result<Vec<Invitation>, StoreError> {
        let mut sql = format!(
            "SELECT {INVITATION_COLS} FROM invitations WHERE accepted_at IS NULL AND (invited_by=?"
        );
        if !company_names.is_empty() {
            sql.push_str(&format!(
                " OR company IN ({})",
                placeholders(company_names.len())
            ));
        }
        sql.push_str(") ORDER BY created_at, rowid");

        let mut query = sqlx::query_as::<_, InvitationRow>(&sql).bind(inviter.to_string());
        for name in company_names {
            query = query.bind(name);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(invitation_from).collect()
    }

    async fn delete_invitation(&self, invitation_id: &InvitationId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM invitations WHERE id=?")
            .bind(invitation_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn accept_invitation(
        &self,
        params: &AcceptInvitationParams,
    ) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLS} FROM invitations WHERE id=?"
        ))
        .bind(params.invitation_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;
        let invitation = invitation_from(row.ok_or(StoreError::NotFound)?)?;
        if invitation.accepted_at.is_some() {
            return Err(StoreError::Conflict);
        }

        sqlx::query("UPDATE invitations SET accepted_at=? WHERE id=?")
            .bind(now)
            .bind(invitation.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        // Find-or-create the company named on the invitation. Owner roles
        // get no company membership.
        let company_id: Option<String> = match (params.owner_role, invitation.company.as_deref()) {
            (true, _) | (false, None) => None,
            (false, Some(name)) => {
                let existing: Option<(String,)> =
                    sqlx::query_as("SELECT id FROM companies WHERE name=?")
                        .bind(name)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(backend)?;
                match existing {
                    Some((id,)) => Some(id),
                    None => {
                        let id = Uuid::now_v7().to_string();
                        sqlx::query(&format!(
                            "INSERT INTO companies({COMPANY_COLS}) \
                             VALUES(?,?,NULL,'active',NULL,?,NULL,?)"
                        ))
                        .bind(&id)
                        .bind(name)
                        .bind(now)
                        .bind(now)
                        .execute(&mut *tx)
                        .await
                        .map_err(insert_err)?;
                        Some(id)
                    }
                }
            }
        };

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email=?")
            .bind(&invitation.email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let user_id = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE users SET role_id=?, company_id=? WHERE id=?")
                    .bind(params.role_id.to_string())
                    .bind(company_id.as_deref())
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;
                id
            }
            None => {
                let id = Uuid::now_v7().to_string();
                sqlx::query(&format!(
                    "INSERT INTO users({USER_COLS}) VALUES(?,?,?,?,?,'active',?)"
                ))
                .bind(&id)
                .bind(invitation.name.as_deref())
                .bind(&invitation.email)
                .bind(params.role_id.to_string())
                .bind(company_id.as_deref())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(insert_err)?;
                id
            }
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLS} FROM users WHERE id=?"
        ))
        .bind(&user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        user_from(row)
    }

    // ─────────────────────────────── Projects ─────────────────────────────

    async fn create_project(&self, params: &CreateProjectParams) -> Result<Project, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        sqlx::query(&format!(
            "INSERT INTO projects({PROJECT_COLS}) VALUES(?,?,?,?,?,?)"
        ))
        .bind(&id)
        .bind(&params.title)
        .bind(params.created_by.to_string())
        .bind(params.assigned_admin_id.map(|u| u.to_string()))
        .bind(params.assigned_manager_id.map(|u| u.to_string()))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(Project {
            id: ProjectId(parse_id(&id)?),
            title: params.title.clone(),
            created_by: params.created_by,
            assigned_admin_id: params.assigned_admin_id,
            assigned_manager_id: params.assigned_manager_id,
            created_at: from_ts(now),
        })
    }

    async fn find_project_by_id(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLS} FROM projects WHERE id=?"
        ))
        .bind(project_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(project_from).transpose()
    }

    async fn assign_project(
        &self,
        project_id: &ProjectId,
        assigned_admin_id: Option<UserId>,
        assigned_manager_id: Option<UserId>,
    ) -> Result<Project, StoreError> {
        let result = sqlx::query(
            "UPDATE projects SET assigned_admin_id=?, assigned_manager_id=? WHERE id=?",
        )
        .bind(assigned_admin_id.map(|u| u.to_string()))
        .bind(assigned_manager_id.map(|u| u.to_string()))
        .bind(project_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_project_by_id(project_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        if !filter.created_by.is_empty() {
            clauses.push(format!(
                "created_by IN ({})",
                placeholders(filter.created_by.len())
            ));
        }
        if filter.assigned_admin.is_some() {
            clauses.push("assigned_admin_id=?".to_string());
        }
        if filter.assigned_manager.is_some() {
            clauses.push("assigned_manager_id=?".to_string());
        }
        if filter.site_team_member.is_some() {
            clauses.push("id IN (SELECT project_id FROM site_team WHERE user_id=?)".to_string());
        }
        if clauses.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {PROJECT_COLS} FROM projects WHERE {} ORDER BY created_at, rowid",
            clauses.join(" OR ")
        );
        let mut query = sqlx::query_as::<_, ProjectRow>(&sql);
        for id in &filter.created_by {
            query = query.bind(id.to_string());
        }
        if let Some(id) = filter.assigned_admin {
            query = query.bind(id.to_string());
        }
        if let Some(id) = filter.assigned_manager {
            query = query.bind(id.to_string());
        }
        if let Some(id) = filter.site_team_member {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.into_iter().map(project_from).collect()
    }

    // ────────────────────────────── Site team ─────────────────────────────

    async fn add_site_team_member(
        &self,
        params: &AddSiteTeamParams,
    ) -> Result<SiteTeamMember, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();
        sqlx::query(&format!(
            "INSERT INTO site_team({SITE_TEAM_COLS}) VALUES(?,?,?,?,?,?)"
        ))
        .bind(&id)
        .bind(params.project_id.to_string())
        .bind(params.user_id.to_string())
        .bind(params.role.as_deref())
        .bind(params.created_by.map(|u| u.to_string()))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(SiteTeamMember {
            id: SiteTeamId(parse_id(&id)?),
            project_id: params.project_id,
            user_id: params.user_id,
            role: params.role.clone(),
            created_by: params.created_by,
            created_at: from_ts(now),
        })
    }

    async fn list_site_team(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<SiteTeamMember>, StoreError> {
        let rows = sqlx::query_as::<_, SiteTeamRow>(&format!(
            "SELECT {SITE_TEAM_COLS} FROM site_team WHERE project_id=? ORDER BY created_at, rowid"
        ))
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(site_team_from).collect()
    }

    async fn list_site_memberships(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SiteTeamMember>, StoreError> {
        let rows = sqlx::query_as::<_, SiteTeamRow>(&format!(
            "SELECT {SITE_TEAM_COLS} FROM site_team WHERE user_id=? ORDER BY created_at, rowid"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(site_team_from).collect()
    }

    async fn clear_site_team(&self, project_id: &ProjectId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM site_team WHERE project_id=?")
            .bind(project_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
