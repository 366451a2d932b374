//! Integration tests for the GamepadTest site.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gamepadtest-integration-tests
//! ```
//!
//! The full router runs in-process against [`MemoryBlogStore`] and
//! [`StubAuthApi`]; no hosted project or network is needed. Requests go
//! through `tower::ServiceExt::oneshot`.
//!
//! # Test Categories
//!
//! - `public_blogs` - Public blog API
//! - `admin_blogs` - Admin CRUD
//! - `admin_gate` - Token and admin-list checks
//! - `admin_auth` - Login, signup, logout, session endpoints
//! - `auth_context` - Admin auth state machine
//! - `pages` - Server-rendered pages, health and response headers

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use tower::ServiceExt;
use url::Url;

use gamepadtest_core::{Blog, Email, NewBlog};
use gamepadtest_site::{
    app,
    config::{SiteConfig, SupabaseConfig},
    db::{BlogStore, MemoryBlogStore},
    services::auth::{AuthApi, AuthError, AuthSession, AuthUser, SignUpOutcome},
    state::AppState,
};

/// HS256 secret shared by the stub auth service and the site.
pub const JWT_SECRET: &str = "Gt7vQ2mX9pL4rN8sW1kZ6bH3jD5fC0yTa8uE2wR6";

/// Email present in `admin_users`.
pub const ADMIN_EMAIL: &str = "admin@gamepadtest.com";

/// Signed-in user who is not an admin.
pub const EDITOR_EMAIL: &str = "editor@gamepadtest.com";

/// Password the stub auth service accepts for every account.
pub const PASSWORD: &str = "correct horse battery staple";

pub const BASE_URL: &str = "https://gamepadtest.test";

/// Configuration for an in-process site.
#[must_use]
pub fn test_config() -> SiteConfig {
    SiteConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: BASE_URL.to_string(),
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../site/static"),
        cors_origins: vec![BASE_URL.to_string()],
        supabase: SupabaseConfig {
            url: Url::parse("https://project.supabase.test").unwrap(),
            key: SecretString::from("anon-key"),
        },
        jwt_secret: SecretString::from(JWT_SECRET),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Sign `claims` as a compact HS256 JWT.
#[must_use]
pub fn sign_token(claims: &serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Claims the auth service puts in an access token.
#[must_use]
pub fn claims(email: &str, role: &str, expires_in: Duration) -> serde_json::Value {
    serde_json::json!({
        "sub": format!("user-{email}"),
        "email": email,
        "role": role,
        "aud": "authenticated",
        "exp": (Utc::now() + expires_in).timestamp(),
    })
}

/// A valid one-hour access token for `email`.
#[must_use]
pub fn access_token(email: &str) -> String {
    sign_token(
        &claims(email, "authenticated", Duration::hours(1)),
        JWT_SECRET,
    )
}

// =============================================================================
// Stub auth service
// =============================================================================

/// In-process auth service issuing real signed tokens.
pub struct StubAuthApi {
    ttl: Duration,
    pub confirm_signups: AtomicBool,
    pub refresh_fails: AtomicBool,
    pub sign_out_fails: AtomicBool,
    pub sign_outs: AtomicUsize,
}

impl Default for StubAuthApi {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl StubAuthApi {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            confirm_signups: AtomicBool::new(false),
            refresh_fails: AtomicBool::new(false),
            sign_out_fails: AtomicBool::new(false),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// A session for `email` that expires after `ttl`.
    #[must_use]
    pub fn session(email: &str, ttl: Duration) -> AuthSession {
        AuthSession {
            access_token: sign_token(&claims(email, "authenticated", ttl), JWT_SECRET),
            refresh_token: format!("refresh-{email}"),
            expires_at: Utc::now() + ttl,
            user: AuthUser {
                id: format!("user-{email}"),
                email: Some(email.to_string()),
            },
        }
    }
}

#[async_trait]
impl AuthApi for StubAuthApi {
    async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        if password.expose_secret() != PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Self::session(email.as_str(), self.ttl))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(AuthError::SessionExpired);
        }
        let email = refresh_token.trim_start_matches("refresh-");
        Ok(Self::session(email, self.ttl))
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        if password.expose_secret().len() < 6 {
            return Err(AuthError::Rejected {
                status: 422,
                message: "Password should be at least 6 characters".to_string(),
            });
        }
        if self.confirm_signups.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome::ConfirmationPending(AuthUser {
                id: format!("user-{email}"),
                email: Some(email.as_str().to_string()),
            }));
        }
        Ok(SignUpOutcome::Session(Self::session(email.as_str(), self.ttl)))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(AuthError::Upstream {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Test application
// =============================================================================

/// Response with the body read to the end.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The site router over in-memory services.
pub struct TestApp {
    pub store: Arc<MemoryBlogStore>,
    pub auth: Arc<StubAuthApi>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// A site whose only admin is [`ADMIN_EMAIL`].
    #[must_use]
    pub fn new() -> Self {
        let admin = Email::parse(ADMIN_EMAIL).unwrap();
        let store = Arc::new(MemoryBlogStore::new().with_admin(admin));
        let auth = Arc::new(StubAuthApi::default());
        let state = AppState::with_clients(test_config(), store.clone(), auth.clone());
        Self {
            store,
            auth,
            router: app(state),
        }
    }

    /// Insert a blog straight into the store.
    pub async fn seed(&self, title: &str, content: &str, published: bool) -> Blog {
        let draft = NewBlog {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            excerpt: None,
            featured_image: None,
            published: Some(published),
        }
        .prepare()
        .unwrap();
        self.store.insert(draft).await.unwrap()
    }

    /// Send a request. Adds a client IP header for the rate limiter when
    /// the request has none.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        if !request.headers().contains_key("x-forwarded-for") {
            request
                .headers_mut()
                .insert("x-forwarded-for", "203.0.113.10".parse().unwrap());
        }
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(request(Method::GET, path, None, None)).await
    }

    /// Request with an optional bearer token and JSON body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        self.send(request(method, path, token, body)).await
    }
}

/// Build a request with an optional bearer token and JSON body.
#[must_use]
pub fn request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}
