//! Member Types
//!
//! The member record belongs to the membership system. The access engine only
//! ever sees the read-only [`Principal`] snapshot built from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::{Role, RoleFlags};
use crate::error::Error;

/// Membership status as recorded by the membership office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MembershipStatus {
    Full,
    Student,
    Family,
    Service,
    Founding,
    Honorary,
    Introductory,
    Emeritus,
    Temporary,
    Pending,
    Inactive,
    #[default]
    NonMember,
    Deceased,
}

impl MembershipStatus {
    /// Stored name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Student => "student",
            Self::Family => "family",
            Self::Service => "service",
            Self::Founding => "founding",
            Self::Honorary => "honorary",
            Self::Introductory => "introductory",
            Self::Emeritus => "emeritus",
            Self::Temporary => "temporary",
            Self::Pending => "pending",
            Self::Inactive => "inactive",
            Self::NonMember => "non_member",
            Self::Deceased => "deceased",
        }
    }

    /// Every known status.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Full,
            Self::Student,
            Self::Family,
            Self::Service,
            Self::Founding,
            Self::Honorary,
            Self::Introductory,
            Self::Emeritus,
            Self::Temporary,
            Self::Pending,
            Self::Inactive,
            Self::NonMember,
            Self::Deceased,
        ]
    }

    /// Whether this status counts as an active membership.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Full
                | Self::Student
                | Self::Family
                | Self::Service
                | Self::Founding
                | Self::Honorary
                | Self::Introductory
                | Self::Emeritus
                | Self::Temporary
        )
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the display form as well ("Full Member", "Non-Member").
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let stripped = normalized.strip_suffix("_member").unwrap_or(&normalized);
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized || status.as_str() == stripped)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Capability snapshot of whoever is making a request.
///
/// Built once per request from the member record (or as anonymous) and never
/// mutated by the access engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Member ID. `None` for anonymous visitors.
    pub id: Option<Uuid>,
    /// Whether the request carried a valid identity.
    pub authenticated: bool,
    /// Site-wide superuser.
    pub superuser: bool,
    /// Roles held by the member.
    pub roles: RoleFlags,
    /// Whether the membership is currently active.
    pub active_member: bool,
}

impl Principal {
    /// An unauthenticated visitor.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            id: None,
            authenticated: false,
            superuser: false,
            roles: RoleFlags::empty(),
            active_member: false,
        }
    }

    /// An authenticated member with the given status and roles.
    #[must_use]
    pub const fn member(id: Uuid, status: MembershipStatus, roles: RoleFlags) -> Self {
        Self {
            id: Some(id),
            authenticated: true,
            superuser: false,
            roles,
            active_member: status.is_active(),
        }
    }

    /// Mark the principal as superuser.
    #[must_use]
    pub const fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    /// Whether this is an anonymous visitor.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        !self.authenticated
    }

    /// Whether the principal holds `role`.
    #[must_use]
    pub const fn has_role(&self, role: Role) -> bool {
        self.authenticated && self.roles.contains(role.flag())
    }

    /// Whether the principal holds an officer role.
    #[must_use]
    pub const fn is_officer(&self) -> bool {
        self.authenticated && self.roles.intersects(RoleFlags::OFFICERS)
    }

    /// Superuser or webmaster.
    #[must_use]
    pub const fn is_site_admin(&self) -> bool {
        self.authenticated && (self.superuser || self.has_role(Role::Webmaster))
    }

    /// Whether the membership is currently active.
    #[must_use]
    pub const fn is_active_member(&self) -> bool {
        self.authenticated && self.active_member
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}
