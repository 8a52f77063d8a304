//! Invitation types.
//!
//! An invitation is the only durable record of "who invited whom with what
//! role" — it is the edge data of the organization graph. Lifecycle:
//! pending → accepted (terminal) or pending → deleted (cancellation /
//! superseding re-invite). An accepted invitation is immutable and kept as
//! an audit trail.

use chrono::{DateTime, Utc};

use super::{InvitationId, RoleId, UserId};

/// Invitation record.
#[derive(Clone, Debug)]
pub struct Invitation {
    pub id: InvitationId,
    /// Not unique — superseded by a fresh invite to the same address.
    pub email: String,
    pub name: Option<String>,
    /// Free-text company name, not a foreign key.
    pub company: Option<String>,
    /// Legacy backend role name ("user", not "basic").
    pub role: Option<String>,
    /// Display-role alias as submitted by newer clients.
    pub frontend_role: Option<String>,
    pub invited_by: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.accepted_at.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Parameters for creating an invitation.
#[derive(Clone, Debug)]
pub struct CreateInvitationParams {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub frontend_role: Option<String>,
    pub invited_by: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Parameters for the atomic acceptance transaction: mark accepted,
/// find-or-create the company named on the invitation, create or update
/// the invited user. Commits or rolls back together (a torn write leaves a
/// duplicate membership only manual cleanup can resolve).
#[derive(Clone, Debug)]
pub struct AcceptInvitationParams {
    pub invitation_id: InvitationId,
    /// Role row resolved (alias-aware) from the invitation's role name.
    pub role_id: RoleId,
    /// True when the resolved role is super_admin: the user then gets no
    /// company and no company row is created.
    pub owner_role: bool,
}
