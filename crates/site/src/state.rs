//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::db::{BlogStore, RepositoryError, SupabaseStore};
use crate::services::auth::{AuthApi, AuthError, GoTrueApi, TokenVerifier};

/// Error building the hosted-service clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("row store client: {0}")]
    Store(#[from] RepositoryError),
    #[error("auth client: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is immutable; the hosted
/// service owns all mutable data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    store: Arc<dyn BlogStore>,
    auth: Arc<dyn AuthApi>,
    tokens: TokenVerifier,
}

impl AppState {
    /// Create state with clients for the configured hosted project.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: SiteConfig) -> Result<Self, StateError> {
        let store = Arc::new(SupabaseStore::new(&config.supabase)?);
        let auth = Arc::new(GoTrueApi::new(&config.supabase)?);
        Ok(Self::with_clients(config, store, auth))
    }

    /// Create state around existing clients (tests, offline rendering).
    #[must_use]
    pub fn with_clients(
        config: SiteConfig,
        store: Arc<dyn BlogStore>,
        auth: Arc<dyn AuthApi>,
    ) -> Self {
        let tokens = TokenVerifier::new(&config.jwt_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                tokens,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get the blog row store.
    #[must_use]
    pub fn store(&self) -> &dyn BlogStore {
        self.inner.store.as_ref()
    }

    /// Get the auth service client.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthApi {
        self.inner.auth.as_ref()
    }

    /// Get the access token verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenVerifier {
        &self.inner.tokens
    }
}
