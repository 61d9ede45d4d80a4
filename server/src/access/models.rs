//! Database models for the page access engine.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gp_common::RoleRequirement;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A node in the page tree.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, utoipa::ToSchema)]
pub struct Page {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    pub is_public: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw role grant row. The role name is parsed into a [`RoleRequirement`]
/// before it reaches the evaluator.
#[derive(Debug, Clone, FromRow)]
pub struct RoleGrantRow {
    pub page_id: Uuid,
    pub role_name: String,
}

/// Explicit per-member edit grant.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, utoipa::ToSchema)]
pub struct PageMemberGrant {
    pub page_id: Uuid,
    pub member_id: Uuid,
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A document attached to a page. Carries no permission state of its own.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, utoipa::ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub page_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

/// Input for [`create_page`](super::queries::create_page).
#[derive(Debug, Clone)]
pub struct NewPage {
    pub parent_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    /// `None` takes the parent's visibility (private at the root).
    pub is_public: Option<bool>,
    pub created_by: Option<Uuid>,
}

/// Input for [`create_document`](super::queries::create_document).
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub page_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
}

/// A page together with its grants, as loaded for one evaluation.
///
/// Everything the evaluator needs is here; deciding never goes back to
/// the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAccess {
    pub page: Page,
    /// Required roles, combined with OR.
    pub role_grants: BTreeSet<RoleRequirement>,
    /// Members with an explicit edit grant.
    pub member_grants: BTreeSet<Uuid>,
}

impl PageAccess {
    /// A page with no grants.
    #[must_use]
    pub const fn new(page: Page) -> Self {
        Self {
            page,
            role_grants: BTreeSet::new(),
            member_grants: BTreeSet::new(),
        }
    }

    /// Add a required role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<RoleRequirement>) -> Self {
        self.role_grants.insert(role.into());
        self
    }

    /// Add an explicit member grant.
    #[must_use]
    pub fn with_member(mut self, member_id: Uuid) -> Self {
        self.member_grants.insert(member_id);
        self
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.page.id
    }

    #[must_use]
    pub const fn parent_id(&self) -> Option<Uuid> {
        self.page.parent_id
    }

    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.page.is_public
    }

    /// Whether `member_id` holds an explicit grant on this page.
    #[must_use]
    pub fn has_member_grant(&self, member_id: Uuid) -> bool {
        self.member_grants.contains(&member_id)
    }

    /// Role names for API responses.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.role_grants.iter().map(|r| r.as_str().to_string()).collect()
    }
}

/// API view of a page with its grants.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PageDetail {
    #[serde(flatten)]
    pub page: Page,
    /// Required roles (any one suffices).
    pub required_roles: Vec<String>,
    /// Members with an explicit edit grant.
    pub member_grants: Vec<Uuid>,
}

impl From<PageAccess> for PageDetail {
    fn from(access: PageAccess) -> Self {
        let required_roles = access.role_names();
        Self {
            page: access.page,
            required_roles,
            member_grants: access.member_grants.into_iter().collect(),
        }
    }
}
