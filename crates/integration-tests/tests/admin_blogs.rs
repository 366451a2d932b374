//! Admin blog CRUD.

use axum::http::{Method, StatusCode};
use gamepadtest_integration_tests::{ADMIN_EMAIL, TestApp, access_token};
use serde_json::json;

fn admin() -> String {
    access_token(ADMIN_EMAIL)
}

#[tokio::test]
async fn test_list_all_includes_drafts() {
    let app = TestApp::new();
    app.seed("Live", "", true).await;
    app.seed("Draft", "", false).await;

    let response = app
        .call(Method::GET, "/api/admin/blogs", Some(&admin()), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_defaults_and_slug() {
    let app = TestApp::new();
    let response = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({"title": "Hello, World!", "content": "Body"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let blog = response.json();
    assert_eq!(blog["slug"], "hello-world");
    assert_eq!(blog["published"], false);
    assert_eq!(blog["excerpt"], "");
    assert_eq!(blog["featured_image"], serde_json::Value::Null);
    assert_eq!(blog["author_id"], "admin");
    assert!(blog["id"].as_str().is_some());

    // Drafts stay hidden from the public API
    let response = app.get("/api/blogs/hello-world").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_published_then_get_by_slug() {
    let app = TestApp::new();
    let created = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({
                "title": "Fixing Stick Drift",
                "content": "Clean the potentiometer.",
                "excerpt": "A quick fix",
                "published": true
            })),
        )
        .await
        .json();

    let fetched = app.get("/api/blogs/fixing-stick-drift").await;
    assert_eq!(fetched.status, StatusCode::OK);
    let fetched = fetched.json();
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["title"], "Fixing Stick Drift");
    assert_eq!(fetched["content"], "Clean the potentiometer.");
    assert_eq!(fetched["excerpt"], "A quick fix");
}

#[tokio::test]
async fn test_create_stores_title_and_image_as_sent() {
    let app = TestApp::new();
    let response = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({"title": "  Padded Title  ", "featured_image": "", "published": true})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let fetched = app.get("/api/blogs/padded-title").await;
    assert_eq!(fetched.status, StatusCode::OK);
    let fetched = fetched.json();
    assert_eq!(fetched["title"], "  Padded Title  ");
    assert_eq!(fetched["featured_image"], "");
}

#[tokio::test]
async fn test_create_then_publish_then_get_by_slug() {
    let app = TestApp::new();
    let created = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({"title": "Trigger Test", "content": "Pull gently."})),
        )
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let response = app
        .call(
            Method::PATCH,
            &format!("/api/admin/blogs/{id}"),
            Some(&admin()),
            Some(json!({"published": true})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let fetched = app.get("/api/blogs/trigger-test").await.json();
    assert_eq!(fetched["content"], "Pull gently.");
}

#[tokio::test]
async fn test_create_requires_title() {
    let app = TestApp::new();
    for body in [
        json!({"content": "no title"}),
        json!({"title": "", "content": "empty"}),
        json!({"title": "   "}),
    ] {
        let response = app
            .call(Method::POST, "/api/admin/blogs", Some(&admin()), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json(), json!({"error": "Title is required"}));
    }

    let all = app
        .call(Method::GET, "/api/admin/blogs", Some(&admin()), None)
        .await
        .json();
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = TestApp::new();
    let response = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({"title": 42})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());
}

#[tokio::test]
async fn test_update_changes_only_supplied_fields() {
    let app = TestApp::new();
    let original = app.seed("Original Title", "Original body", false).await;

    for method in [Method::PATCH, Method::PUT] {
        let before = app
            .call(Method::GET, "/api/admin/blogs", Some(&admin()), None)
            .await
            .json()[0]
            .clone();

        let response = app
            .call(
                method.clone(),
                &format!("/api/admin/blogs/{}", original.id),
                Some(&admin()),
                Some(json!({"content": format!("Body via {method}")})),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{method}");

        let after = response.json();
        assert_eq!(after["content"], format!("Body via {method}"));
        assert_eq!(after["title"], "Original Title");
        assert_eq!(after["slug"], "original-title");
        assert_eq!(after["published"], false);
        assert_eq!(after["created_at"], before["created_at"]);

        let before_updated: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(before["updated_at"].clone()).unwrap();
        let after_updated: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(after["updated_at"].clone()).unwrap();
        assert!(after_updated > before_updated, "{method}");
    }
}

#[tokio::test]
async fn test_update_title_keeps_slug() {
    let app = TestApp::new();
    let blog = app.seed("Old Name", "", true).await;

    let after = app
        .call(
            Method::PATCH,
            &format!("/api/admin/blogs/{}", blog.id),
            Some(&admin()),
            Some(json!({"title": "New Name"})),
        )
        .await
        .json();
    assert_eq!(after["title"], "New Name");
    assert_eq!(after["slug"], "old-name");
}

#[tokio::test]
async fn test_empty_patch_still_advances_updated_at() {
    let app = TestApp::new();
    let blog = app.seed("Untouched", "", false).await;

    let after = app
        .call(
            Method::PATCH,
            &format!("/api/admin/blogs/{}", blog.id),
            Some(&admin()),
            Some(json!({})),
        )
        .await
        .json();
    let updated: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(after["updated_at"].clone()).unwrap();
    assert!(updated > blog.updated_at);
}

#[tokio::test]
async fn test_featured_image_null_clears() {
    let app = TestApp::new();
    let created = app
        .call(
            Method::POST,
            "/api/admin/blogs",
            Some(&admin()),
            Some(json!({"title": "With Image", "featured_image": "https://cdn.test/a.png"})),
        )
        .await
        .json();
    assert_eq!(created["featured_image"], "https://cdn.test/a.png");
    let path = format!("/api/admin/blogs/{}", created["id"].as_str().unwrap());

    let kept = app
        .call(Method::PATCH, &path, Some(&admin()), Some(json!({"excerpt": "x"})))
        .await
        .json();
    assert_eq!(kept["featured_image"], "https://cdn.test/a.png");

    let cleared = app
        .call(
            Method::PATCH,
            &path,
            Some(&admin()),
            Some(json!({"featured_image": null})),
        )
        .await
        .json();
    assert_eq!(cleared["featured_image"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = TestApp::new();
    for id in ["6f1c2d44-3f0e-4f55-9a2b-0c9d8e7f6a5b", "not-a-uuid"] {
        let response = app
            .call(
                Method::PATCH,
                &format!("/api/admin/blogs/{id}"),
                Some(&admin()),
                Some(json!({"title": "x"})),
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{id}");
        assert_eq!(response.json(), json!({"error": "Blog not found"}));
    }
}

#[tokio::test]
async fn test_delete() {
    let app = TestApp::new();
    let blog = app.seed("Doomed", "", true).await;
    let path = format!("/api/admin/blogs/{}", blog.id);

    let response = app.call(Method::DELETE, &path, Some(&admin()), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"success": true}));
    assert_eq!(app.get("/api/blogs/doomed").await.status, StatusCode::NOT_FOUND);

    // Deleting again is still a success
    let response = app.call(Method::DELETE, &path, Some(&admin()), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"success": true}));
}

#[tokio::test]
async fn test_admin_store_failure_is_internal_error() {
    let app = TestApp::new();
    let token = admin();
    app.store.set_unavailable(true);

    let response = app
        .call(Method::GET, "/api/admin/blogs", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_admin_responses_are_not_cached() {
    let app = TestApp::new();
    let response = app
        .call(Method::GET, "/api/admin/blogs", Some(&admin()), None)
        .await;
    assert_eq!(response.header("cache-control"), Some("no-store, max-age=0"));
}
