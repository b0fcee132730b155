mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn signup_then_login() {
    let app = TestApp::new();

    let response = app
        .post_json("/auth/signup/", json!({ "username": "writer", "password": "correct horse" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["username"], "writer");
    let token = body["token"].as_str().unwrap().to_string();

    // The issued token opens protected pages.
    let page = rendered(app.get("/create/", Some(&token)).await).await;
    assert_eq!(page.template, "posts/create_post.html");

    let response = app
        .post_json("/auth/login/?next=%2Fcreate%2F", json!({ "username": "writer", "password": "correct horse" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["next"], "/create/");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.post_json("/auth/signup/", json!({ "username": "writer", "password": "correct horse" }))
        .await;

    let response = app
        .post_json("/auth/login/", json!({ "username": "writer", "password": "wrong password" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json("/auth/login/", json!({ "username": "ghost", "password": "whatever1" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    let creds = json!({ "username": "writer", "password": "correct horse" });
    assert_eq!(app.post_json("/auth/signup/", creds.clone()).await.status(), StatusCode::CREATED);
    assert_eq!(app.post_json("/auth/signup/", creds).await.status(), StatusCode::CONFLICT);

    let short = json!({ "username": "other", "password": "short" });
    assert_eq!(app.post_json("/auth/signup/", short).await.status(), StatusCode::BAD_REQUEST);

    let spaced = json!({ "username": "has space", "password": "long enough" });
    assert_eq!(app.post_json("/auth/signup/", spaced).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_signups_for_one_name_conflict() {
    let app = TestApp::new();
    let creds = json!({ "username": "racer", "password": "correct horse" });
    let (a, b) = tokio::join!(
        app.post_json("/auth/signup/", creds.clone()),
        app.post_json("/auth/signup/", creds),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn login_page_carries_next() {
    let app = TestApp::new();
    let page = rendered(app.get("/auth/login/?next=%2Fcreate%2F", None).await).await;
    assert_eq!(page.template, "users/login.html");
    assert_eq!(page.context["next"], "/create/");
}
