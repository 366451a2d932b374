//! Blog entity and the payloads that create and modify it.
//!
//! The hosted row store owns the canonical record; these types mirror the
//! `blogs` and `admin_users` tables as they travel over JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::email::Email;
use super::id::{AdminUserId, BlogId};
use super::slug::{Slug, SlugError};

/// Author recorded on every new blog row.
pub const DEFAULT_AUTHOR_ID: &str = "admin";

/// A blog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Short summary; `null` in the store reads as an empty string.
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published: bool,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request.
///
/// Every field is optional on the wire; [`NewBlog::prepare`] enforces the
/// title and fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlog {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Why a [`NewBlog`] could not become a row.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// No title, or a title of only whitespace.
    #[error("title is required")]
    MissingTitle,
    /// The title has no characters a slug can keep.
    #[error(transparent)]
    Slug(#[from] SlugError),
}

/// A fully defaulted row, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogDraft {
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published: bool,
    pub author_id: String,
}

impl NewBlog {
    /// Validate the title, derive the slug and apply defaults.
    ///
    /// The title is stored as sent; only the emptiness check and the slug
    /// see it trimmed. Defaults: `content` and `excerpt` to `""`,
    /// `featured_image` to absent, `published` to `false`, `author_id` to
    /// [`DEFAULT_AUTHOR_ID`].
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] if the title is missing or has no slug.
    pub fn prepare(self) -> Result<BlogDraft, DraftError> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(DraftError::MissingTitle)?;
        let slug = Slug::from_title(title.trim())?;

        Ok(BlogDraft {
            title,
            slug,
            content: self.content.unwrap_or_default(),
            excerpt: self.excerpt.unwrap_or_default(),
            featured_image: self.featured_image,
            published: self.published.unwrap_or(false),
            author_id: DEFAULT_AUTHOR_ID.to_owned(),
        })
    }
}

/// Body of an update request.
///
/// Only supplied fields change. `featured_image: null` clears the image;
/// leaving the key out keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub featured_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl BlogPatch {
    /// Whether the patch carries no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.excerpt.is_none()
            && self.featured_image.is_none()
            && self.published.is_none()
    }

    /// Apply the supplied fields to a row and stamp `updated_at`.
    ///
    /// The slug is never re-derived.
    pub fn apply(self, blog: &mut Blog, updated_at: DateTime<Utc>) {
        if let Some(title) = self.title {
            blog.title = title;
        }
        if let Some(content) = self.content {
            blog.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            blog.excerpt = excerpt;
        }
        if let Some(featured_image) = self.featured_image {
            blog.featured_image = featured_image;
        }
        if let Some(published) = self.published {
            blog.published = published;
        }
        blog.updated_at = updated_at;
    }
}

/// A row of `admin_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
