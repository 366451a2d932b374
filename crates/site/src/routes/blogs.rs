//! Blog API handlers.
//!
//! Public and admin routes share one implementation parameterized by
//! [`Visibility`]; the admin wrappers only add the [`RequireAdmin`] gate.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{info, instrument};

use gamepadtest_core::{Blog, BlogId, BlogPatch, DraftError, NewBlog, Visibility};

use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const BLOG_NOT_FOUND: &str = "Blog not found";

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// ============================================================================
// Shared implementation
// ============================================================================

async fn list(store: &dyn BlogStore, visibility: Visibility) -> Result<Vec<Blog>> {
    Ok(store.list(visibility).await?)
}

async fn show(store: &dyn BlogStore, slug: &str, visibility: Visibility) -> Result<Blog> {
    store
        .find_by_slug(slug, visibility)
        .await?
        .ok_or(AppError::NotFound(BLOG_NOT_FOUND))
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Ids that are not UUIDs cannot name a row.
fn parse_id(id: &str) -> Result<BlogId> {
    id.parse().map_err(|_| AppError::NotFound(BLOG_NOT_FOUND))
}

// ============================================================================
// Public routes
// ============================================================================

/// List published blogs, newest first.
///
/// GET /api/blogs
#[instrument(skip(state))]
pub async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<Blog>>> {
    list(state.store(), Visibility::Published).await.map(Json)
}

/// Get one published blog.
///
/// GET /api/blogs/{slug}
///
/// Unpublished rows answer exactly like missing ones.
#[instrument(skip(state))]
pub async fn show_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Blog>> {
    show(state.store(), &slug, Visibility::Published).await.map(Json)
}

// ============================================================================
// Admin routes
// ============================================================================

/// List every blog, drafts included.
///
/// GET /api/admin/blogs
#[instrument(skip_all)]
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Blog>>> {
    list(state.store(), Visibility::All).await.map(Json)
}

/// Create a blog.
///
/// POST /api/admin/blogs
///
/// # Errors
///
/// 400 when the title is missing or blank.
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: std::result::Result<Json<NewBlog>, JsonRejection>,
) -> Result<(StatusCode, Json<Blog>)> {
    let draft = json_body(body)?.prepare().map_err(|e| match e {
        DraftError::MissingTitle => AppError::BadRequest("Title is required".to_string()),
        DraftError::Slug(_) => {
            AppError::BadRequest("Title must contain at least one letter or digit".to_string())
        }
    })?;

    let blog = state.store().insert(draft).await?;
    info!(id = %blog.id, slug = %blog.slug, "Blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

/// Update the supplied fields of a blog.
///
/// PATCH /api/admin/blogs/{id}
/// PUT   /api/admin/blogs/{id}
///
/// `updated_at` advances even when the body carries no field.
#[instrument(skip(admin, state, body), fields(admin = %admin.email))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<BlogPatch>, JsonRejection>,
) -> Result<Json<Blog>> {
    let id = parse_id(&id)?;
    let patch = json_body(body)?;

    let blog = state
        .store()
        .update(id, patch)
        .await?
        .ok_or(AppError::NotFound(BLOG_NOT_FOUND))?;
    info!(id = %blog.id, "Blog updated");
    Ok(Json(blog))
}

/// Delete a blog. Deleting an unknown id succeeds.
///
/// DELETE /api/admin/blogs/{id}
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if let Ok(id) = id.parse::<BlogId>() {
        state.store().delete(id).await?;
        info!(%id, "Blog deleted");
    }
    Ok(Json(DeleteResponse { success: true }))
}
