//! Row store access for the site.
//!
//! The hosted service owns every blog and admin row; the site keeps no local
//! copy. Handlers talk to it only through [`BlogStore`]:
//!
//! - [`SupabaseStore`] - the `PostgREST` endpoint of the hosted project
//! - [`MemoryBlogStore`] - in-process rows for tests and offline rendering
//!
//! ## Tables
//!
//! - `blogs` - `id, title, slug, content, excerpt, featured_image, published,
//!   author_id, created_at, updated_at`
//! - `admin_users` - `id, email, created_at` (emails stored lower-case)

mod memory;
mod supabase;

use async_trait::async_trait;
use thiserror::Error;

use gamepadtest_core::{Blog, BlogDraft, BlogId, BlogPatch, Email, Visibility};

pub use memory::MemoryBlogStore;
pub use supabase::{SupabaseStore, service_headers};

/// Errors that can occur when talking to the row store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Blog and admin row operations.
///
/// Public and admin callers share every query; [`Visibility`] decides whether
/// unpublished rows are part of the result.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// All visible rows, newest `created_at` first.
    async fn list(&self, visibility: Visibility) -> Result<Vec<Blog>, RepositoryError>;

    /// The first visible row with this slug.
    async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<Blog>, RepositoryError>;

    /// Persist a new row and return it as stored.
    async fn insert(&self, draft: BlogDraft) -> Result<Blog, RepositoryError>;

    /// Apply a patch and stamp `updated_at`.
    ///
    /// Returns `None` when no row has this id.
    async fn update(&self, id: BlogId, patch: BlogPatch) -> Result<Option<Blog>, RepositoryError>;

    /// Remove a row. Removing a missing id succeeds.
    async fn delete(&self, id: BlogId) -> Result<(), RepositoryError>;

    /// Whether `admin_users` lists this email.
    async fn is_admin(&self, email: &Email) -> Result<bool, RepositoryError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
