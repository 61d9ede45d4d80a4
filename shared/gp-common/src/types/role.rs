//! Role Vocabulary
//!
//! The club's role set is fixed. Pages name the roles they require as
//! [`RoleRequirement`]s; members carry the roles they hold as [`RoleFlags`].

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::Error;

bitflags! {
    /// Role flags held by a member, one bit per [`Role`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RoleFlags: u16 {
        const INSTRUCTOR             = 1 << 0;
        const TOWPILOT               = 1 << 1;
        const DUTY_OFFICER           = 1 << 2;
        const ASSISTANT_DUTY_OFFICER = 1 << 3;
        const DIRECTOR               = 1 << 4;
        const SECRETARY              = 1 << 5;
        const TREASURER              = 1 << 6;
        const WEBMASTER              = 1 << 7;
        const MEMBER_MANAGER         = 1 << 8;
        const ROSTERMEISTER          = 1 << 9;
    }
}

impl RoleFlags {
    /// Roles with unconditional edit rights on every page.
    pub const OFFICERS: Self = Self::DIRECTOR
        .union(Self::SECRETARY)
        .union(Self::WEBMASTER);
}

/// A named club role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Instructor,
    Towpilot,
    DutyOfficer,
    AssistantDutyOfficer,
    Director,
    Secretary,
    Treasurer,
    Webmaster,
    MemberManager,
    Rostermeister,
}

impl Role {
    /// Stored name of the role.
    ///
    /// ```
    /// use gp_common::Role;
    ///
    /// assert_eq!(Role::DutyOfficer.as_str(), "duty_officer");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Towpilot => "towpilot",
            Self::DutyOfficer => "duty_officer",
            Self::AssistantDutyOfficer => "assistant_duty_officer",
            Self::Director => "director",
            Self::Secretary => "secretary",
            Self::Treasurer => "treasurer",
            Self::Webmaster => "webmaster",
            Self::MemberManager => "member_manager",
            Self::Rostermeister => "rostermeister",
        }
    }

    /// Every role in the vocabulary.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Instructor,
            Self::Towpilot,
            Self::DutyOfficer,
            Self::AssistantDutyOfficer,
            Self::Director,
            Self::Secretary,
            Self::Treasurer,
            Self::Webmaster,
            Self::MemberManager,
            Self::Rostermeister,
        ]
    }

    /// The flag bit for this role.
    #[must_use]
    pub const fn flag(self) -> RoleFlags {
        match self {
            Self::Instructor => RoleFlags::INSTRUCTOR,
            Self::Towpilot => RoleFlags::TOWPILOT,
            Self::DutyOfficer => RoleFlags::DUTY_OFFICER,
            Self::AssistantDutyOfficer => RoleFlags::ASSISTANT_DUTY_OFFICER,
            Self::Director => RoleFlags::DIRECTOR,
            Self::Secretary => RoleFlags::SECRETARY,
            Self::Treasurer => RoleFlags::TREASURER,
            Self::Webmaster => RoleFlags::WEBMASTER,
            Self::MemberManager => RoleFlags::MEMBER_MANAGER,
            Self::Rostermeister => RoleFlags::ROSTERMEISTER,
        }
    }

    /// Whether this role confers unconditional edit rights.
    #[must_use]
    pub const fn is_officer(self) -> bool {
        RoleFlags::OFFICERS.contains(self.flag())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older records use hyphens ("duty-officer").
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| Error::UnknownRole(s.to_string()))
    }
}

/// Stored name of the "any active member" sentinel.
pub const ANY_ACTIVE_MEMBER: &str = "any_active_member";

/// A role a page requires from its viewers.
///
/// Several requirements on one page combine with OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleRequirement {
    /// Satisfied by any active member.
    AnyActiveMember,
    /// Satisfied by members holding this role.
    Role(Role),
}

impl RoleRequirement {
    /// Stored name of the requirement.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnyActiveMember => ANY_ACTIVE_MEMBER,
            Self::Role(role) => role.as_str(),
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(role: Role) -> Self {
        Self::Role(role)
    }
}

impl From<RoleRequirement> for String {
    fn from(req: RoleRequirement) -> Self {
        req.as_str().to_string()
    }
}

impl TryFrom<String> for RoleRequirement {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleRequirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == ANY_ACTIVE_MEMBER {
            return Ok(Self::AnyActiveMember);
        }
        s.parse::<Role>().map(Self::Role)
    }
}
