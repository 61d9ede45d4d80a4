//! Slug helpers.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

use super::constants::{MAX_SLUG_LENGTH, RESERVED_SLUGS};

/// Lowercase alphanumerics separated by single dashes.
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Generate URL-friendly slug from title.
#[must_use]
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.len() <= MAX_SLUG_LENGTH {
        slug
    } else {
        slug.chars()
            .take(MAX_SLUG_LENGTH)
            .collect::<String>()
            .trim_end_matches('-')
            .to_string()
    }
}

/// Check if slug is a reserved system path.
#[must_use]
pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

/// Validate a page slug.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(invalid("slug_empty", "Slug cannot be empty".to_string()));
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(invalid(
            "slug_too_long",
            format!("Slug exceeds {MAX_SLUG_LENGTH} characters"),
        ));
    }
    if is_reserved_slug(slug) {
        return Err(invalid("slug_reserved", format!("'{slug}' is a reserved slug")));
    }
    if !SLUG_PATTERN.is_match(slug) {
        return Err(invalid(
            "slug_format",
            "Use lowercase letters, numbers, and single dashes (e.g. 'board-minutes')".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Board Minutes"), "board-minutes");
        assert_eq!(slugify("  Duty Officer -- Handbook!  "), "duty-officer-handbook");
        assert_eq!(slugify("2024"), "2024");
        assert_eq!(slugify("Überflug"), "berflug");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a ".repeat(MAX_SLUG_LENGTH);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("board-minutes").is_ok());
        assert!(validate_slug("2024").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Board").is_err());
        assert!(validate_slug("-board").is_err());
        assert!(validate_slug("board--minutes").is_err());
        assert!(validate_slug("board/minutes").is_err());
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_reserved_slugs_rejected() {
        assert!(is_reserved_slug("admin"));
        assert!(!is_reserved_slug("board"));
        let err = validate_slug("api").unwrap_err();
        assert_eq!(err.code, "slug_reserved");
    }
}
