//! URL-safe blog slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The title contains no ASCII letters or digits.
    #[error("title must contain at least one letter or digit")]
    Empty,
}

/// A URL-safe identifier derived from a blog title.
///
/// ## Invariants
///
/// - Only `[a-z0-9-]`
/// - No leading or trailing hyphen, no consecutive hyphens
/// - Never empty
///
/// ## Examples
///
/// ```
/// use gamepadtest_core::Slug;
///
/// assert_eq!(Slug::from_title("Hello, World!").unwrap().as_str(), "hello-world");
/// assert_eq!(Slug::from_title("  PS5 vs. Xbox -- Drift?  ").unwrap().as_str(), "ps5-vs-xbox-drift");
/// assert!(Slug::from_title("!!!").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a title.
    ///
    /// Lower-cases the title, collapses every run of characters outside
    /// `[a-z0-9]` into a single hyphen and trims hyphens at both ends.
    /// Non-ASCII letters count as separators.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing alphanumeric remains.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(title.len());
        let mut pending_hyphen = false;

        for c in title.chars().map(|c| c.to_ascii_lowercase()) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            } else {
                pending_hyphen = true;
            }
        }

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }

        Ok(Self(slug))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
