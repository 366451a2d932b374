//! In-process blog store.
//!
//! Mirrors [`super::SupabaseStore`] row for row so router tests and offline
//! rendering exercise the same handler paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use tokio::sync::RwLock;

use gamepadtest_core::{Blog, BlogDraft, BlogId, BlogPatch, Email, Visibility};

use super::{BlogStore, RepositoryError};

/// Blog rows and admin emails held in memory.
#[derive(Default)]
pub struct MemoryBlogStore {
    rows: RwLock<Rows>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct Rows {
    blogs: Vec<Blog>,
    admins: HashSet<Email>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Rows {
    /// Microsecond timestamp strictly after every earlier stamp.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let next = match self.last_stamp {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(next);
        next
    }
}

impl MemoryBlogStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an administrator email.
    #[must_use]
    pub fn with_admin(mut self, email: Email) -> Self {
        self.rows.get_mut().admins.insert(email);
        self
    }

    /// Make every operation fail as if the hosted service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Api {
                status: 503,
                message: "store unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn list(&self, visibility: Visibility) -> Result<Vec<Blog>, RepositoryError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        let mut blogs: Vec<Blog> = rows
            .blogs
            .iter()
            .filter(|blog| visibility.admits(blog.published))
            .cloned()
            .collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blogs)
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        visibility: Visibility,
    ) -> Result<Option<Blog>, RepositoryError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .blogs
            .iter()
            .find(|blog| blog.slug == slug && visibility.admits(blog.published))
            .cloned())
    }

    async fn insert(&self, draft: BlogDraft) -> Result<Blog, RepositoryError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        let at = rows.stamp();
        let blog = Blog {
            id: BlogId::generate(),
            title: draft.title,
            slug: draft.slug.into_inner(),
            content: draft.content,
            excerpt: draft.excerpt,
            featured_image: draft.featured_image,
            published: draft.published,
            author_id: draft.author_id,
            created_at: at,
            updated_at: at,
        };
        rows.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update(&self, id: BlogId, patch: BlogPatch) -> Result<Option<Blog>, RepositoryError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        let at = rows.stamp();
        let Some(blog) = rows.blogs.iter_mut().find(|blog| blog.id == id) else {
            return Ok(None);
        };
        patch.apply(blog, at);
        Ok(Some(blog.clone()))
    }

    async fn delete(&self, id: BlogId) -> Result<(), RepositoryError> {
        self.check_available()?;
        self.rows.write().await.blogs.retain(|blog| blog.id != id);
        Ok(())
    }

    async fn is_admin(&self, email: &Email) -> Result<bool, RepositoryError> {
        self.check_available()?;
        Ok(self.rows.read().await.admins.contains(email))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}
