//! Strongly-typed identifiers (avoid mixing strings/UUIDs arbitrarily).

use std::fmt;

use uuid::Uuid;

/// User identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

/// Role identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

/// Company identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompanyId(pub Uuid);

/// Invitation identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InvitationId(pub Uuid);

/// Project identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectId(pub Uuid);

/// Site-team membership identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SiteTeamId(pub Uuid);

macro_rules! display_as_uuid {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        })*
    };
}

display_as_uuid!(UserId, RoleId, CompanyId, InvitationId, ProjectId, SiteTeamId);
