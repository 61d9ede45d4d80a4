//! Request and response types for the page routes.

use gp_common::Principal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::slug::validate_slug;
use crate::access::{can_create_in_chain, can_edit_in_editor, Page, PageAccess};

/// Request body for creating a page.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreatePageRequest {
    /// Parent page (root when absent).
    pub parent_id: Option<Uuid>,
    /// Page title (1-200 characters).
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// URL slug (generated from the title when absent).
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    /// Visibility (defaults to the parent's).
    pub is_public: Option<bool>,
}

/// Request body for updating a page.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdatePageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub is_public: Option<bool>,
}

/// Request body for registering a document on a page.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    pub content_type: Option<String>,
    #[validate(range(min = 0))]
    pub size_bytes: i64,
}

/// One step of the path to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Breadcrumb {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

/// A page as served to a caller who may view it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PageView {
    #[serde(flatten)]
    pub page: Page,
    /// Slug path from the root, without a leading slash.
    pub path: String,
    /// Ancestors from the root, excluding the page itself.
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Whether the caller may edit this page in the editor.
    pub can_edit: bool,
    /// Whether the caller may create pages under this one.
    pub can_create_child: bool,
}

impl PageView {
    /// Build the view for the last page of a root-first chain.
    ///
    /// Returns `None` for an empty chain.
    #[must_use]
    pub fn build(principal: &Principal, chain: &[PageAccess]) -> Option<Self> {
        let (target, ancestors) = chain.split_last()?;
        Some(Self {
            page: target.page.clone(),
            path: chain_path(chain),
            breadcrumbs: ancestors
                .iter()
                .map(|a| Breadcrumb {
                    id: a.id(),
                    slug: a.page.slug.clone(),
                    title: a.page.title.clone(),
                })
                .collect(),
            can_edit: can_edit_in_editor(principal, target),
            can_create_child: can_create_in_chain(principal, chain),
        })
    }
}

/// The caller's decisions for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct AccessSummary {
    pub page_id: Uuid,
    /// View, including every ancestor.
    pub can_view: bool,
    /// Back-office edit.
    pub can_edit: bool,
    /// Interactive editor edit.
    pub can_edit_in_editor: bool,
    pub can_create_child: bool,
}

/// Slug path of a root-first chain.
#[must_use]
pub fn chain_path(chain: &[PageAccess]) -> String {
    chain
        .iter()
        .map(|p| p.page.slug.as_str())
        .collect::<Vec<_>>()
        .join("/")
}
