//! Server-rendered pages, health checks and response headers.

use axum::http::StatusCode;
use gamepadtest_integration_tests::TestApp;

fn csp_nonce(policy: &str) -> &str {
    let start = policy.find("'nonce-").unwrap() + "'nonce-".len();
    let end = start + policy[start..].find('\'').unwrap();
    &policy[start..end]
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
    app.store.set_unavailable(true);
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_static_files() {
    let app = TestApp::new();
    let response = app.get("/static/robots.txt").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("User-agent"));

    assert_eq!(app.get("/static/missing.css").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_pages_talk_json_to_the_api() {
    let app = TestApp::new();
    for path in ["/admin", "/admin/login"] {
        let html = app.get(path).await.text();
        assert!(html.contains(r#"<script src="/static/admin.js" defer></script>"#));
        assert!(!html.contains("method=\"post\""));
    }

    let script = app.get("/static/admin.js").await;
    assert_eq!(script.status, StatusCode::OK);
    let source = script.text();
    assert!(source.contains("/api/admin/auth/login"));
    assert!(source.contains("/api/admin/blogs"));
    assert!(source.contains(r#""Content-Type"] = "application/json""#));
    assert!(source.contains(r#""Bearer " + token()"#));
}

#[tokio::test]
async fn test_home_page() {
    let app = TestApp::new();
    app.seed("Stick Drift Explained", "", true).await;
    app.seed("Unreleased Review", "", false).await;

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("content-type").unwrap().starts_with("text/html"));

    let html = response.text();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Gamepad Tester - Test Your Controller Online | GamepadTest</title>"));
    assert!(html.contains("id=\"gamepad-tester\""));
    assert!(html.contains("Check a controller before you blame the game."));
    assert!(!html.contains("<script src="));
    assert!(html.contains("href=\"/blog/stick-drift-explained\""));
    assert!(!html.contains("unreleased-review"));
}

#[tokio::test]
async fn test_blog_index_lists_published_only() {
    let app = TestApp::new();
    app.seed("Published Guide", "word ".repeat(450).as_str(), true).await;
    app.seed("Draft Guide", "", false).await;

    let response = app.get("/blog").await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("href=\"/blog/published-guide\""));
    assert!(html.contains("3 min read"));
    assert!(!html.contains("draft-guide"));
}

#[tokio::test]
async fn test_blog_post_page() {
    let app = TestApp::new();
    app.seed(
        "Fixing Stick Drift",
        "## Clean the sensor\n\nUse **isopropyl** alcohol.\n\n<script>alert(1)</script>",
        true,
    )
    .await;

    let response = app.get("/blog/fixing-stick-drift").await;
    assert_eq!(response.status, StatusCode::OK);

    let html = response.text();
    assert!(html.contains("<title>Fixing Stick Drift | GamepadTest Blog</title>"));
    assert!(html.contains("<strong>isopropyl</strong>"));
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains(
        "<link rel=\"canonical\" href=\"https://gamepadtest.test/blog/fixing-stick-drift\">"
    ));
    assert!(html.contains("application/ld+json"));

    // The JSON-LD script carries this response's nonce
    let policy = response.header("content-security-policy").unwrap();
    let nonce = csp_nonce(policy);
    assert!(html.contains(&format!("nonce=\"{nonce}\"")));
}

#[tokio::test]
async fn test_unpublished_post_page_is_not_found() {
    let app = TestApp::new();
    app.seed("Embargoed Review", "leaked specs", false).await;

    let response = app.get("/blog/embargoed-review").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let html = response.text();
    assert!(html.contains("Page not found"));
    assert!(html.contains("<meta name=\"robots\" content=\"noindex\">"));
    assert!(!html.contains("leaked specs"));
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.text().contains("Page not found"));
}

#[tokio::test]
async fn test_static_pages() {
    let app = TestApp::new();
    for (path, title) in [
        ("/about", "About | GamepadTest"),
        ("/privacy", "Privacy Policy | GamepadTest"),
        ("/admin", "Blog Admin | GamepadTest"),
        ("/admin/login", "Admin Sign In | GamepadTest"),
        ("/blog/", "Blog | GamepadTest"),
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::OK, "{path}");
        assert!(
            response.text().contains(&format!("<title>{title}</title>")),
            "{path}"
        );
    }
}

#[tokio::test]
async fn test_store_failure_renders_error_page() {
    let app = TestApp::new();
    app.store.set_unavailable(true);

    let response = app.get("/blog").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let html = response.text();
    assert!(html.contains("Something went wrong"));

    let request_id = response.header("x-request-id").unwrap();
    assert!(html.contains(request_id));

    // Pages that need no data still render
    assert_eq!(app.get("/about").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers() {
    let app = TestApp::new();
    let response = app.get("/").await;

    assert_eq!(response.header("x-frame-options"), Some("DENY"));
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(
        response.header("referrer-policy"),
        Some("strict-origin-when-cross-origin")
    );
    assert!(
        response
            .header("permissions-policy")
            .unwrap()
            .contains("gamepad=(self)")
    );
    let policy = response.header("content-security-policy").unwrap();
    assert!(policy.contains("default-src 'none'"));
    assert!(policy.contains("'nonce-"));
    assert_eq!(response.header("cache-control"), None);

    let admin = app.get("/admin").await;
    assert_eq!(admin.header("cache-control"), Some("no-store, max-age=0"));
}

#[tokio::test]
async fn test_nonce_changes_per_request() {
    let app = TestApp::new();
    let first = app.get("/").await;
    let second = app.get("/").await;
    let a = csp_nonce(first.header("content-security-policy").unwrap()).to_string();
    let b = csp_nonce(second.header("content-security-policy").unwrap()).to_string();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = TestApp::new();

    let mut request = gamepadtest_integration_tests::request(
        axum::http::Method::GET,
        "/health",
        None,
        None,
    );
    request
        .headers_mut()
        .insert("x-request-id", "trace-abc-123".parse().unwrap());
    let response = app.send(request).await;
    assert_eq!(response.header("x-request-id"), Some("trace-abc-123"));

    let response = app.get("/health").await;
    let generated = response.header("x-request-id").unwrap();
    assert_eq!(generated.len(), 36);
}
