//! Constants for the page tree.

/// Maximum slug length in characters.
pub const MAX_SLUG_LENGTH: usize = 100;

/// Content type recorded when the uploader sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Reserved slugs that cannot be used for pages.
///
/// These collide with site routes and would make a page unreachable by
/// path.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin",
    "api",
    "by-path",
    "new",
    "edit",
    "delete",
    "documents",
    "login",
    "logout",
    "media",
    "static",
    "settings",
];
