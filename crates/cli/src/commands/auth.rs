//! Admin sign-in commands.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print an access token for `blog --token`
//! gt-cli auth login -e admin@gamepadtest.com
//!
//! # Register an account
//! gt-cli auth signup -e editor@gamepadtest.com
//!
//! # Sign in and follow the session until Ctrl+C or sign-out
//! gt-cli auth watch
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - Hosted project
//! - `GT_ADMIN_EMAIL`, `GT_ADMIN_PASSWORD` - Default credentials

use gamepadtest_site::services::auth::{AdminAuthState, SignUpOutcome};

use super::{AdminCredentials, CliError, admin_auth};

fn describe(state: &AdminAuthState) -> String {
    match state {
        AdminAuthState::Loading => "loading".to_string(),
        AdminAuthState::Authenticated { email } => format!("authenticated as {email}"),
        AdminAuthState::Anonymous => "anonymous".to_string(),
    }
}

/// Sign in and print the access token.
///
/// # Errors
///
/// Returns `CliError` if the project is not configured or sign-in fails.
pub async fn login(credentials: &AdminCredentials) -> Result<(), CliError> {
    let auth = admin_auth()?;
    auth.ready().await;

    let session = auth
        .login(&credentials.email, &credentials.password)
        .await?;

    tracing::info!(
        "State: {}, token expires at {}",
        describe(&auth.state()),
        session.expires_at
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{}", session.access_token);
    }
    Ok(())
}

/// Register an account.
///
/// # Errors
///
/// Returns `CliError` if the project is not configured or the service
/// refuses the signup.
pub async fn signup(credentials: &AdminCredentials) -> Result<(), CliError> {
    let auth = admin_auth()?;
    auth.ready().await;

    match auth
        .signup(&credentials.email, &credentials.password)
        .await?
    {
        SignUpOutcome::Session(_) => {
            tracing::info!("Account created. State: {}", describe(&auth.state()));
        }
        SignUpOutcome::ConfirmationPending(_) => {
            tracing::info!(
                "Confirmation email sent to {}. State: {}",
                credentials.email,
                describe(&auth.state())
            );
        }
    }
    tracing::warn!(
        "New accounts cannot use the admin API until their email is added to admin_users."
    );
    Ok(())
}

/// Sign in, then log every state transition until Ctrl+C or sign-out.
///
/// Token refreshes happen in the background as the session expires.
///
/// # Errors
///
/// Returns `CliError` if the project is not configured or sign-in fails.
pub async fn watch(credentials: &AdminCredentials) -> Result<(), CliError> {
    let auth = admin_auth()?;
    let mut states = auth.subscribe();
    tracing::info!("State: {}", describe(&auth.ready().await));

    auth.login(&credentials.email, &credentials.password)
        .await?;

    loop {
        let state = states.borrow_and_update().clone();
        tracing::info!("State: {}", describe(&state));
        if state == AdminAuthState::Anonymous {
            break;
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Signing out");
                auth.logout().await;
                tracing::info!("State: {}", describe(&auth.state()));
                break;
            }
        }
    }
    Ok(())
}
