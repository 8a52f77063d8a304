//! Role vocabulary, role records and granted permissions.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::RoleId;

/// The well-known role vocabulary.
///
/// The legacy name `user` and the display name `basic` denote the same
/// role; both parse to [`RoleName::Basic`]. This is THE normalization
/// point — nothing above the storage boundary compares raw role strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleName {
    SuperAdmin,
    Admin,
    Manager,
    Subcontractor,
    Basic,
    DesignTeam,
    Granular,
}

/// Error type for parsing a RoleName from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for RoleName {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "super_admin" => Ok(RoleName::SuperAdmin),
            "admin" => Ok(RoleName::Admin),
            "manager" => Ok(RoleName::Manager),
            "subcontractor" => Ok(RoleName::Subcontractor),
            // `user` is the legacy stored name, `basic` the display name
            "basic" | "user" => Ok(RoleName::Basic),
            "design_team" => Ok(RoleName::DesignTeam),
            "granular" => Ok(RoleName::Granular),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl RoleName {
    /// Canonical stored name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "super_admin",
            RoleName::Admin => "admin",
            RoleName::Manager => "manager",
            RoleName::Subcontractor => "subcontractor",
            RoleName::Basic => "basic",
            RoleName::DesignTeam => "design_team",
            RoleName::Granular => "granular",
        }
    }

    /// All raw spellings this role may appear under in legacy rows.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            RoleName::Basic => &["basic", "user"],
            RoleName::SuperAdmin => &["super_admin"],
            RoleName::Admin => &["admin"],
            RoleName::Manager => &["manager"],
            RoleName::Subcontractor => &["subcontractor"],
            RoleName::DesignTeam => &["design_team"],
            RoleName::Granular => &["granular"],
        }
    }

    /// Alias-aware, case-insensitive comparison against a raw column value.
    pub fn matches(&self, raw: &str) -> bool {
        raw.parse::<RoleName>().is_ok_and(|r| r == *self)
    }

    /// Roles this role is allowed to invite (one rung down and below).
    pub fn invitable_roles(&self) -> &'static [RoleName] {
        match self {
            RoleName::SuperAdmin => &[
                RoleName::Admin,
                RoleName::Manager,
                RoleName::Subcontractor,
                RoleName::Basic,
            ],
            RoleName::Admin => &[RoleName::Manager, RoleName::Subcontractor, RoleName::Basic],
            RoleName::Manager => &[RoleName::Subcontractor, RoleName::Basic],
            RoleName::Subcontractor => &[RoleName::Basic],
            RoleName::Basic | RoleName::DesignTeam | RoleName::Granular => &[],
        }
    }
}

/// Role record. Custom roles may exist beyond the well-known vocabulary,
/// so the raw name is kept alongside its parsed form.
#[derive(Clone, Debug)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// The well-known role this row denotes, if any.
    pub fn well_known(&self) -> Option<RoleName> {
        self.name.parse().ok()
    }
}

/// Scope attached to a granted permission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionScope {
    /// Unrestricted grant.
    Full,
    /// Grant restricted to a named scope value.
    Named(String),
}

impl PermissionScope {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("full") {
            PermissionScope::Full
        } else {
            PermissionScope::Named(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PermissionScope::Full => "full",
            PermissionScope::Named(s) => s,
        }
    }

    /// Whether this grant satisfies a request for `requested` scope.
    pub fn satisfies(&self, requested: Option<&str>) -> bool {
        match (self, requested) {
            (PermissionScope::Full, _) => true,
            (_, None) => true,
            (PermissionScope::Named(granted), Some(req)) => granted == req,
        }
    }
}

/// A permission granted to a role.
#[derive(Clone, Debug)]
pub struct GrantedPermission {
    pub permission: String,
    pub scope: PermissionScope,
}

/// Parameters for creating a role.
#[derive(Clone, Debug)]
pub struct CreateRoleParams {
    pub name: String,
    pub permissions: Vec<GrantedPermission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_and_user_are_the_same_role() {
        assert_eq!("user".parse::<RoleName>().unwrap(), RoleName::Basic);
        assert_eq!("basic".parse::<RoleName>().unwrap(), RoleName::Basic);
        assert!(RoleName::Basic.matches("User"));
        assert!(RoleName::Basic.matches("BASIC"));
        assert!(!RoleName::Basic.matches("manager"));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            "Super_Admin".parse::<RoleName>().unwrap(),
            RoleName::SuperAdmin
        );
        assert!("owner".parse::<RoleName>().is_err());
    }

    #[test]
    fn invite_hierarchy_narrows_down_the_chain() {
        assert!(RoleName::SuperAdmin
            .invitable_roles()
            .contains(&RoleName::Admin));
        assert!(!RoleName::Admin.invitable_roles().contains(&RoleName::Admin));
        assert!(RoleName::Basic.invitable_roles().is_empty());
    }

    #[test]
    fn full_scope_satisfies_everything() {
        assert!(PermissionScope::Full.satisfies(Some("projects")));
        assert!(PermissionScope::Named("projects".into()).satisfies(Some("projects")));
        assert!(!PermissionScope::Named("projects".into()).satisfies(Some("tasks")));
        assert!(PermissionScope::Named("projects".into()).satisfies(None));
    }
}
