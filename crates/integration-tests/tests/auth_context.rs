//! Admin auth context driven by the stub auth service.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration as StdDuration;

use chrono::Duration;
use gamepadtest_integration_tests::{ADMIN_EMAIL, EDITOR_EMAIL, PASSWORD, StubAuthApi};
use gamepadtest_site::services::auth::{AdminAuth, AdminAuthState, SessionClient, SignUpOutcome};
use secrecy::SecretString;

fn context(api: StubAuthApi) -> (AdminAuth, Arc<StubAuthApi>) {
    let api = Arc::new(api);
    let client = Arc::new(SessionClient::new(api.clone()));
    (AdminAuth::new(client), api)
}

fn password() -> SecretString {
    SecretString::from(PASSWORD)
}

fn authenticated(email: &str) -> AdminAuthState {
    AdminAuthState::Authenticated {
        email: email.to_string(),
    }
}

async fn wait_for(auth: &AdminAuth, expected: &AdminAuthState) {
    let mut states = auth.subscribe();
    tokio::time::timeout(StdDuration::from_secs(5), states.wait_for(|s| s == expected))
        .await
        .unwrap_or_else(|_| panic!("state never became {expected:?}, last {:?}", auth.state()))
        .unwrap();
}

#[tokio::test]
async fn test_starts_loading_then_anonymous() {
    let (auth, _) = context(StubAuthApi::default());
    assert_eq!(auth.ready().await, AdminAuthState::Anonymous);
    assert!(!auth.state().is_logged_in());
}

#[tokio::test]
async fn test_login_and_logout() {
    let (auth, api) = context(StubAuthApi::default());
    auth.ready().await;

    let session = auth.login(ADMIN_EMAIL, &password()).await.unwrap();
    assert_eq!(session.user.email.as_deref(), Some(ADMIN_EMAIL));
    assert_eq!(auth.state(), authenticated(ADMIN_EMAIL));
    assert_eq!(auth.state().admin_email(), Some(ADMIN_EMAIL));

    auth.logout().await;
    assert_eq!(auth.state(), AdminAuthState::Anonymous);
    assert_eq!(api.sign_outs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_ends_anonymous_even_when_revocation_fails() {
    let (auth, api) = context(StubAuthApi::default());
    auth.ready().await;
    auth.login(ADMIN_EMAIL, &password()).await.unwrap();

    api.sign_out_fails.store(true, Ordering::SeqCst);
    auth.logout().await;
    assert_eq!(auth.state(), AdminAuthState::Anonymous);
    assert!(auth.client().get_session().await.is_none());
}

#[tokio::test]
async fn test_failed_login_stays_anonymous() {
    let (auth, _) = context(StubAuthApi::default());
    auth.ready().await;

    let err = auth
        .login(ADMIN_EMAIL, &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid credentials");
    assert_eq!(auth.state(), AdminAuthState::Anonymous);

    let err = auth.login("bad address", &password()).await.unwrap_err();
    assert!(err.to_string().starts_with("invalid email"));
    assert_eq!(auth.state(), AdminAuthState::Anonymous);
}

#[tokio::test]
async fn test_follows_latest_notification() {
    let (auth, _) = context(StubAuthApi::default());
    auth.ready().await;
    auth.login(ADMIN_EMAIL, &password()).await.unwrap();

    // Another component of the client adopts a different session
    auth.client()
        .set_session(StubAuthApi::session(EDITOR_EMAIL, Duration::hours(1)))
        .await;
    wait_for(&auth, &authenticated(EDITOR_EMAIL)).await;

    auth.client().sign_out().await;
    wait_for(&auth, &AdminAuthState::Anonymous).await;
}

#[tokio::test]
async fn test_expired_session_refreshes() {
    let (auth, _) = context(StubAuthApi::new(Duration::milliseconds(200)));
    auth.ready().await;
    let first = auth.login(ADMIN_EMAIL, &password()).await.unwrap();

    tokio::time::sleep(StdDuration::from_millis(400)).await;
    let refreshed = auth.client().get_session().await.unwrap();
    assert!(refreshed.expires_at > first.expires_at);
    assert_eq!(auth.state(), authenticated(ADMIN_EMAIL));
}

#[tokio::test]
async fn test_failed_refresh_signs_out() {
    let (auth, api) = context(StubAuthApi::new(Duration::milliseconds(200)));
    auth.ready().await;
    auth.login(ADMIN_EMAIL, &password()).await.unwrap();
    api.refresh_fails.store(true, Ordering::SeqCst);

    wait_for(&auth, &AdminAuthState::Anonymous).await;
}

#[tokio::test]
async fn test_pending_signup_leaves_state() {
    let (auth, api) = context(StubAuthApi::default());
    auth.ready().await;
    api.confirm_signups.store(true, Ordering::SeqCst);

    let outcome = auth.signup(EDITOR_EMAIL, &password()).await.unwrap();
    assert!(matches!(outcome, SignUpOutcome::ConfirmationPending(_)));
    assert_eq!(auth.state(), AdminAuthState::Anonymous);

    api.confirm_signups.store(false, Ordering::SeqCst);
    let outcome = auth.signup(EDITOR_EMAIL, &password()).await.unwrap();
    assert!(matches!(outcome, SignUpOutcome::Session(_)));
    assert_eq!(auth.state(), authenticated(EDITOR_EMAIL));
}
