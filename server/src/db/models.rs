//! Database Models

use chrono::{DateTime, Utc};
use gp_common::{MembershipStatus, Principal, RoleFlags};
use serde::Serialize;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// Member record, mirrored from the membership system.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub membership_status: String,
    pub is_superuser: bool,
    pub is_service_account: bool,
    pub instructor: bool,
    pub towpilot: bool,
    pub duty_officer: bool,
    pub assistant_duty_officer: bool,
    pub director: bool,
    pub secretary: bool,
    pub treasurer: bool,
    pub webmaster: bool,
    pub member_manager: bool,
    pub rostermeister: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Role flags from the boolean role columns.
    #[must_use]
    pub fn role_flags(&self) -> RoleFlags {
        [
            (self.instructor, RoleFlags::INSTRUCTOR),
            (self.towpilot, RoleFlags::TOWPILOT),
            (self.duty_officer, RoleFlags::DUTY_OFFICER),
            (self.assistant_duty_officer, RoleFlags::ASSISTANT_DUTY_OFFICER),
            (self.director, RoleFlags::DIRECTOR),
            (self.secretary, RoleFlags::SECRETARY),
            (self.treasurer, RoleFlags::TREASURER),
            (self.webmaster, RoleFlags::WEBMASTER),
            (self.member_manager, RoleFlags::MEMBER_MANAGER),
            (self.rostermeister, RoleFlags::ROSTERMEISTER),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .fold(RoleFlags::empty(), |acc, (_, flag)| acc | flag)
    }

    /// Parsed membership status. Unknown values count as non-members.
    #[must_use]
    pub fn status(&self) -> MembershipStatus {
        self.membership_status.parse().unwrap_or_else(|_| {
            warn!(
                member_id = %self.id,
                status = %self.membership_status,
                "unknown membership status, treating as non-member"
            );
            MembershipStatus::NonMember
        })
    }

    /// Capability snapshot for access decisions.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::member(self.id, self.status(), self.role_flags())
            .with_superuser(self.is_superuser)
    }
}
