//! Page tree routes.
//!
//! Serves pages and their documents by path or ID, and hosts the
//! interactive editor's create, update and delete operations. Access
//! decisions come from [`crate::access`].

pub mod constants;
pub mod error;
pub mod handlers;
pub mod router;
pub mod slug;
pub mod types;

pub use constants::*;
pub use error::{PageError, PageResult};
pub use router::{documents_router, pages_router};
pub use slug::{is_reserved_slug, slugify, validate_slug};
pub use types::*;
