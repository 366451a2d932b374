//! Stateless calls to the hosted auth service.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use gamepadtest_core::Email;

use super::AuthError;
use crate::config::SupabaseConfig;
use crate::db::service_headers;

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";

/// The account an [`AuthSession`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by the auth service.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The signed-in email, normalized.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.user.email.as_deref().and_then(|e| Email::parse(e).ok())
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is usable right away.
    Session(AuthSession),
    /// The service sent a confirmation email; no session yet.
    ConfirmationPending(AuthUser),
}

/// Auth service operations.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a session.
    async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError>;

    /// Revoke the session that owns this access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// `GoTrue` client for the hosted project.
#[derive(Clone)]
pub struct GoTrueApi {
    client: reqwest::Client,
    token_url: Url,
    signup_url: Url,
    logout_url: Url,
}

impl GoTrueApi {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the key or endpoints are invalid, and
    /// `AuthError::Request` if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, AuthError> {
        let headers =
            service_headers(&config.key).map_err(|e| AuthError::Config(e.to_string()))?;
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        let endpoint = |path: &str| {
            config
                .endpoint(path)
                .map_err(|e| AuthError::Config(e.to_string()))
        };

        Ok(Self {
            client,
            token_url: endpoint(TOKEN_PATH)?,
            signup_url: endpoint(SIGNUP_PATH)?,
            logout_url: endpoint(LOGOUT_PATH)?,
        })
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    /// Build a session, preferring `expires_at` over `expires_in`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Decode` when neither field gives a usable expiry.
    fn into_session(self, now: DateTime<Utc>) -> Result<AuthSession, AuthError> {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                self.expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            })
            .ok_or_else(|| AuthError::Decode("token response has no usable expiry".to_owned()))?;

        Ok(AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        })
    }
}

/// Error bodies differ between endpoints; take the first readable field.
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn message(self, fallback: &str) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_owned())
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let fallback = status.canonical_reason().unwrap_or("request failed");
    response
        .json::<ErrorBody>()
        .await
        .unwrap_or_default()
        .message(fallback)
}

/// Map an unsuccessful response, letting the caller decide which statuses
/// are the user's fault.
async fn failure(
    response: reqwest::Response,
    client_fault: impl FnOnce(StatusCode, String) -> AuthError,
) -> AuthError {
    let status = response.status();
    let message = error_message(response).await;
    if status.is_client_error() {
        client_fault(status, message)
    } else {
        AuthError::Upstream {
            status: status.as_u16(),
            message,
        }
    }
}

fn parse_sign_up(body: serde_json::Value, now: DateTime<Utc>) -> Result<SignUpOutcome, AuthError> {
    if body.get("access_token").is_some() {
        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
        return token.into_session(now).map(SignUpOutcome::Session);
    }

    // Some deployments nest the pending account under `user`.
    let user = body.get("user").cloned().unwrap_or(body);
    let user: AuthUser = serde_json::from_value(user).map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(SignUpOutcome::ConfirmationPending(user))
}

#[async_trait]
impl AuthApi for GoTrueApi {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .query(&[("grant_type", "password")])
            .json(&Credentials {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure(response, |_, _| AuthError::InvalidCredentials).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        token.into_session(Utc::now())
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshBody { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure(response, |_, _| AuthError::SessionExpired).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        token.into_session(Utc::now())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .client
            .post(self.signup_url.clone())
            .json(&Credentials {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure(response, |status, message| AuthError::Rejected {
                status: status.as_u16(),
                message,
            })
            .await);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        parse_sign_up(body, Utc::now())
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.logout_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure(response, |status, message| AuthError::Rejected {
                status: status.as_u16(),
                message,
            })
            .await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_token_response_prefers_absolute_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_740_830_400,
            "user": {"id": "u1", "email": "admin@gamepadtest.com"}
        }))
        .unwrap();

        let session = token.into_session(now()).unwrap();
        assert_eq!(session.expires_at.timestamp(), 1_740_830_400);
        assert_eq!(session.email().unwrap().as_str(), "admin@gamepadtest.com");
    }

    #[test]
    fn test_token_response_falls_back_to_expires_in() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "u1"}
        }))
        .unwrap();

        let session = token.into_session(now()).unwrap();
        assert_eq!(session.expires_at, now() + Duration::hours(1));
        assert!(session.email().is_none());
    }

    #[test]
    fn test_token_response_without_usable_expiry() {
        for extra in [
            serde_json::json!({}),
            serde_json::json!({"expires_in": i64::MAX}),
        ] {
            let mut body = serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "user": {"id": "u1"}
            });
            body.as_object_mut()
                .unwrap()
                .extend(extra.as_object().unwrap().clone());
            let token: TokenResponse = serde_json::from_value(body).unwrap();
            assert!(matches!(
                token.into_session(now()),
                Err(AuthError::Decode(_))
            ));
        }
    }

    #[test]
    fn test_parse_sign_up_with_session() {
        let outcome = parse_sign_up(
            serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 60,
                "user": {"id": "u1", "email": "new@gamepadtest.com"}
            }),
            now(),
        )
        .unwrap();
        assert!(matches!(outcome, SignUpOutcome::Session(_)));
    }

    #[test]
    fn test_parse_sign_up_pending_confirmation() {
        let outcome = parse_sign_up(
            serde_json::json!({
                "id": "u2",
                "email": "new@gamepadtest.com",
                "confirmation_sent_at": "2025-03-01T12:00:00Z"
            }),
            now(),
        )
        .unwrap();
        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationPending(AuthUser {
                id: "u2".to_owned(),
                email: Some("new@gamepadtest.com".to_owned()),
            })
        );
    }

    #[test]
    fn test_error_body_message_precedence() {
        let body: ErrorBody = serde_json::from_value(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(body.message("fallback"), "Invalid login credentials");
        assert_eq!(ErrorBody::default().message("fallback"), "fallback");
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access".to_owned(),
            refresh_token: "secret-refresh".to_owned(),
            expires_at: now(),
            user: AuthUser {
                id: "u1".to_owned(),
                email: None,
            },
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(session.is_expired_at(now()));
        assert!(!session.is_expired_at(now() - Duration::seconds(1)));
    }
}
