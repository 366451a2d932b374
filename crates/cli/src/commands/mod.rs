//! `gt-cli` subcommands.

pub mod auth;
pub mod blog;

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;

use gamepadtest_site::config::{ConfigError, SupabaseConfig};
use gamepadtest_site::services::auth::{AdminAuth, AuthError, GoTrueApi, SessionClient};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The hosted service is not configured.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sign-in or sign-up failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Email or password missing.
    #[error("credentials required: pass --email or set GT_ADMIN_EMAIL and GT_ADMIN_PASSWORD")]
    MissingCredentials,

    /// An admin command needs a token and none could be obtained.
    #[error("no access token: pass --token or set GT_ADMIN_EMAIL and GT_ADMIN_PASSWORD")]
    MissingToken,

    /// The site API URL is not valid.
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A slug or id that cannot stand as one path segment.
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),

    /// HTTP request to the site failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The site answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Output could not be serialized.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Email and password from flags or the environment.
pub struct AdminCredentials {
    pub email: String,
    pub password: SecretString,
}

/// An admin auth context over the configured hosted project.
///
/// # Errors
///
/// Returns `CliError` if the project URL or key is missing.
pub fn admin_auth() -> Result<AdminAuth, CliError> {
    let config = SupabaseConfig::from_env()?;
    let api = Arc::new(GoTrueApi::new(&config)?);
    Ok(AdminAuth::new(Arc::new(SessionClient::new(api))))
}
