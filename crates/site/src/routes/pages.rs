//! Server-rendered pages.
//!
//! Every path that no other route claims lands here. The handler loads the
//! route's data, calls [`ssr::render`] and wraps the fragment in the document
//! shell.

use askama::Template;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, instrument};

use gamepadtest_core::Visibility;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{CspNonce, RequestId};
use crate::ssr::{self, Head, RenderContext, RenderError, Route};
use crate::state::AppState;

/// Full HTML document around a rendered fragment.
#[derive(Template)]
#[template(path = "shell.html")]
struct ShellTemplate<'a> {
    head_html: &'a str,
    body_html: &'a str,
}

#[derive(Template)]
#[template(path = "errors/server_error.html")]
struct ServerErrorTemplate<'a> {
    request_id: &'a str,
}

#[derive(Debug, thiserror::Error)]
enum PageError {
    #[error(transparent)]
    Store(#[from] RepositoryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] askama::Error),
}

/// Paths the page renderer never answers.
fn is_excluded(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    path.starts_with("/api/")
        || path == "/api"
        || path.starts_with("/static/")
        || path == "/health"
        || path.starts_with("/health/")
        || last_segment.contains('.')
}

/// Render a page, or the matching error page.
///
/// GET * (fallback)
#[instrument(skip(state, nonce, request_id), fields(path = %uri.path()))]
pub async fn render_page(
    State(state): State<AppState>,
    nonce: CspNonce,
    request_id: RequestId,
    uri: Uri,
) -> Response {
    let path = uri.path();
    if is_excluded(path) {
        return if path.starts_with("/api") {
            AppError::NotFound("Not found").into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        };
    }

    match render_document(&state, path, &nonce).await {
        Ok((status, html)) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Page render failed");
            server_error(&nonce, &request_id)
        }
    }
}

async fn load_context(state: &AppState, route: &Route) -> Result<RenderContext, RepositoryError> {
    let mut context = RenderContext::new(state.config().base_url.clone());
    match route {
        Route::Home | Route::BlogIndex => {
            context.blogs = state.store().list(Visibility::Published).await?;
        }
        Route::BlogPost { slug } => {
            context.blog = state
                .store()
                .find_by_slug(slug, Visibility::Published)
                .await?;
        }
        _ => {}
    }
    Ok(context)
}

async fn render_document(
    state: &AppState,
    path: &str,
    nonce: &CspNonce,
) -> Result<(StatusCode, String), PageError> {
    let route = Route::parse(path);
    let context = load_context(state, &route).await?;

    let mut head = Head::new();
    let body_html = ssr::render(path, &context, &mut head)?;
    let head_html = head.to_html(nonce.value())?;

    let status = if route.is_not_found(&context) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let html = ShellTemplate {
        head_html: &head_html,
        body_html: &body_html,
    }
    .render()?;
    Ok((status, html))
}

fn server_error(nonce: &CspNonce, request_id: &RequestId) -> Response {
    let render = || -> Result<String, askama::Error> {
        let mut head = Head::new();
        head.set_title(format!("Something went wrong | {}", ssr::SITE_NAME));
        head.meta_name("robots", "noindex");
        let head_html = head.to_html(nonce.value())?;
        let body_html = ServerErrorTemplate {
            request_id: &request_id.0,
        }
        .render()?;
        ShellTemplate {
            head_html: &head_html,
            body_html: &body_html,
        }
        .render()
    };

    match render() {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Error page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
