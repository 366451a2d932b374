//! Admin gate for API handlers.
//!
//! [`RequireAdmin`] is a `FromRequestParts` extractor, so it runs before any
//! body extractor: a request without credentials is rejected with 401 before
//! its body is read.
//!
//! | Request | Result |
//! |---|---|
//! | no `Authorization` header | 401 |
//! | not `Bearer <token>`, bad signature, expired, wrong role, no email | 401 |
//! | valid token, email not in `admin_users` | 403 |
//! | row store failure during the lookup | 500 |

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::VerifiedToken;
use crate::state::AppState;

/// Extractor that requires a verified administrator.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub VerifiedToken);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let verified = state.tokens().verify(token).map_err(|e| {
            debug!(error = %e, "Rejected admin token");
            AppError::Unauthorized
        })?;

        if !state.store().is_admin(&verified.email).await? {
            warn!(email = %verified.email, "Signed-in user is not an admin");
            return Err(AppError::Forbidden);
        }

        set_sentry_user(verified.email.as_str());
        Ok(Self(verified))
    }
}

/// The token of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
