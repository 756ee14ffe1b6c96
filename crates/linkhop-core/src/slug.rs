use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short identifier mapping to a destination URL.
///
/// Caller-supplied slugs must be 3-32 characters long and contain only
/// alphanumeric characters, hyphens, or underscores. Slugs arriving on the
/// resolve path are treated as opaque and wrapped with [`Slug::new_unchecked`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 32;

impl Slug {
    /// Creates a new `Slug` after validating the input.
    ///
    /// Valid slugs are 3-32 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(slug: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let slug = slug.into();
        Self::validate(&slug)?;
        Ok(Self(slug))
    }

    /// Creates a `Slug` without validation.
    ///
    /// Use this for slugs produced by trusted generators, or for lookups
    /// where an unknown slug simply resolves to nothing.
    pub fn new_unchecked(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    fn validate(slug: &str) -> std::result::Result<(), CoreError> {
        let len = slug.chars().count();
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&len) {
            return Err(CoreError::InvalidSlug(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH, MAX_LENGTH, len
            )));
        }

        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidSlug(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                slug
            )));
        }

        Ok(())
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        assert!(Slug::new("abc").is_ok());
        assert!(Slug::new("Abc-123_xyz").is_ok());
        assert!(Slug::new("a".repeat(32)).is_ok());
    }

    #[test]
    fn too_short() {
        assert!(Slug::new("ab").is_err());
        assert!(Slug::new("").is_err());
    }

    #[test]
    fn too_long() {
        assert!(Slug::new("a".repeat(33)).is_err());
    }

    #[test]
    fn invalid_characters() {
        assert!(Slug::new("abc def").is_err());
        assert!(Slug::new("abc/def").is_err());
        assert!(Slug::new("abc!def").is_err());
        assert!(Slug::new("ab\u{e9}").is_err());
    }

    #[test]
    fn unchecked_accepts_anything() {
        let slug = Slug::new_unchecked("x");
        assert_eq!(slug.as_str(), "x");
    }

    #[test]
    fn serializes_as_plain_string() {
        let slug = Slug::new("my-link").unwrap();
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"my-link\"");
    }
}
