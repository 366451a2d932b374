//! Admin authentication endpoints.
//!
//! Thin JSON wrappers over the hosted auth service. The browser keeps the
//! returned tokens; the site stores nothing between requests.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument, warn};

use gamepadtest_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, bearer_token};
use crate::services::auth::{AuthSession, SignUpOutcome};
use crate::state::AppState;

/// Login and signup body.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(deserialize_with = "secret_string")]
    pub password: SecretString,
}

fn secret_string<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Tokens handed to the browser after sign-in.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
}

impl SessionResponse {
    fn new(session: AuthSession, fallback_email: &Email) -> Self {
        let email = session
            .email()
            .unwrap_or_else(|| fallback_email.clone())
            .into_inner();
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
            email,
        }
    }
}

/// Signup accepted, waiting for the confirmation email.
#[derive(Debug, Serialize)]
pub struct PendingConfirmation {
    pub pending_confirmation: bool,
    pub email: String,
}

/// The verified administrator behind a token.
#[derive(Debug, Serialize)]
pub struct AdminSessionInfo {
    pub email: String,
    pub is_admin: bool,
}

fn credentials(
    body: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(Email, SecretString)> {
    let Json(Credentials { email, password }) =
        body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let email = Email::parse(&email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;
    Ok((email, password))
}

/// Sign in with email and password.
///
/// POST /api/admin/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let (email, password) = credentials(body)?;

    let session = state
        .auth()
        .password_grant(&email, &password)
        .await
        .inspect_err(|e| warn!(%email, error = %e, "Admin sign-in failed"))?;

    info!(%email, "Admin signed in");
    Ok(Json(SessionResponse::new(session, &email)))
}

/// Register an account.
///
/// POST /api/admin/auth/signup
///
/// 201 with tokens when the account is usable right away, 202 when the
/// service sent a confirmation email instead.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Response> {
    let (email, password) = credentials(body)?;

    let response = match state.auth().sign_up(&email, &password).await? {
        SignUpOutcome::Session(session) => {
            info!(%email, "Account created");
            (StatusCode::CREATED, Json(SessionResponse::new(session, &email))).into_response()
        }
        SignUpOutcome::ConfirmationPending(_) => {
            info!(%email, "Account awaiting confirmation");
            (
                StatusCode::ACCEPTED,
                Json(PendingConfirmation {
                    pending_confirmation: true,
                    email: email.into_inner(),
                }),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Revoke the caller's session.
///
/// POST /api/admin/auth/logout
///
/// Always 204. A failed revocation is only logged.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers)
        && let Err(e) = state.auth().sign_out(token).await
    {
        warn!(error = %e, "Remote sign-out failed");
    }
    StatusCode::NO_CONTENT
}

/// Who the bearer token belongs to.
///
/// GET /api/admin/auth/session
#[instrument(skip_all)]
pub async fn session(RequireAdmin(admin): RequireAdmin) -> Json<AdminSessionInfo> {
    Json(AdminSessionInfo {
        email: admin.email.into_inner(),
        is_admin: true,
    })
}
