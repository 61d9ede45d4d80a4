//! Access engine error types.
//!
//! A `false` access decision is not an error. These cover failed mutations
//! and missing records only.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Data invariant a mutation would have broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    /// Role grants may only be attached to private pages.
    RoleGrantOnPublicPage,
    /// A page with role grants may not become public.
    PublicPageWithRoleGrants,
}

impl Invariant {
    /// Machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RoleGrantOnPublicPage => "role_grant_on_public_page",
            Self::PublicPageWithRoleGrants => "public_page_with_role_grants",
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleGrantOnPublicPage => {
                write!(f, "role grants cannot be attached to a public page")
            }
            Self::PublicPageWithRoleGrants => {
                write!(f, "a page with role grants cannot be made public")
            }
        }
    }
}

/// A record that a caller referenced but that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Page(Uuid),
    Parent(Uuid),
    Member(Uuid),
    Document(Uuid),
    Path(String),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(id) => write!(f, "page {id}"),
            Self::Parent(id) => write!(f, "parent page {id}"),
            Self::Member(id) => write!(f, "member {id}"),
            Self::Document(id) => write!(f, "document {id}"),
            Self::Path(path) => write!(f, "page path '/{path}'"),
        }
    }
}

/// Errors raised by the grant store and mutation entry points.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The mutation was rejected and nothing was written.
    #[error("Invariant violation: {0}")]
    InvariantViolation(Invariant),

    /// Referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(Missing),

    /// A sibling page already uses this slug.
    #[error("Slug '{0}' is already used under this parent")]
    SlugTaken(String),

    /// The page tree would exceed the nesting limit.
    #[error("Pages cannot be nested deeper than {0} levels")]
    TooDeep(usize),

    /// A stored role grant names a role outside the vocabulary.
    #[error("Corrupt role grant: {0}")]
    Vocabulary(#[from] gp_common::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccessError {
    /// Map a unique violation on insert to [`AccessError::SlugTaken`].
    pub(crate) fn from_page_insert(err: sqlx::Error, slug: &str) -> Self {
        if db_error_code(&err).as_deref() == Some(UNIQUE_VIOLATION) {
            Self::SlugTaken(slug.to_string())
        } else {
            Self::Database(err)
        }
    }

    /// Map a foreign key violation on a member grant to a missing member.
    pub(crate) fn from_member_grant_insert(err: sqlx::Error, member_id: Uuid) -> Self {
        if db_error_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            Self::NotFound(Missing::Member(member_id))
        } else {
            Self::Database(err)
        }
    }
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// Result type for access engine mutations.
pub type AccessResult<T> = Result<T, AccessError>;
