//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (row store reachable)
//!
//! # Public blog API
//! GET  /api/blogs                    - Published blogs, newest first
//! GET  /api/blogs/{slug}             - One published blog
//!
//! # Admin blog API (bearer token of an admin)
//! GET    /api/admin/blogs            - Every blog
//! POST   /api/admin/blogs            - Create
//! PATCH  /api/admin/blogs/{id}       - Update supplied fields
//! PUT    /api/admin/blogs/{id}       - Same as PATCH
//! DELETE /api/admin/blogs/{id}       - Delete
//!
//! # Admin auth (rate limited)
//! POST /api/admin/auth/login         - Email + password sign-in
//! POST /api/admin/auth/signup        - Register
//! POST /api/admin/auth/logout        - Revoke the bearer's session
//! GET  /api/admin/auth/session       - Verified admin behind the token
//!
//! # Pages
//! GET  /static/*                     - Static files
//! GET  *                             - Server-rendered pages
//! ```

pub mod auth;
pub mod blogs;
pub mod health;
pub mod pages;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::warn;

use crate::config::SiteConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// CORS for the admin API: configured origins only, with credentials.
#[must_use]
pub fn admin_cors(config: &SiteConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// Create the admin auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
        .route("/session", get(auth::session))
}

/// Create the admin API router.
pub fn admin_routes(config: &SiteConfig) -> Router<AppState> {
    Router::new()
        .route("/blogs", get(blogs::list_all).post(blogs::create))
        .route(
            "/blogs/{id}",
            patch(blogs::update).put(blogs::update).delete(blogs::delete),
        )
        .nest("/auth", auth_routes())
        .layer(admin_cors(config))
}

/// Create all routes for the site.
pub fn routes(config: &SiteConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/blogs", get(blogs::list_published))
        .route("/api/blogs/{slug}", get(blogs::show_published))
        .nest("/api/admin", admin_routes(config))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .fallback(pages::render_page)
}
