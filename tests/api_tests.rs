use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use quill::auth::{Identity, Role};
use quill::config::Config;
use quill::services::NewAccount;
use quill::state::SharedState;
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "root@quill.dev";
const ADMIN_PASSWORD: &str = "admin-password";

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.algorithm = "HS256".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config
}

/// App with one admin already bootstrapped.
async fn spawn_app() -> (Router, Arc<SharedState>) {
    let shared = Arc::new(
        SharedState::new(test_config())
            .await
            .expect("Failed to create shared state"),
    );

    shared
        .account_service
        .register(
            Role::Admin,
            NewAccount {
                email: ADMIN_EMAIL.to_string(),
                username: "root".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            },
        )
        .await
        .expect("Failed to bootstrap admin");

    let state = quill::api::create_app_state(shared.clone(), None);
    (quill::api::router(state), shared)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn form_request(uri: &str, email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
        )
        .body(Body::from(format!("username={email}&password={password}")))
        .unwrap()
}

async fn register(app: &Router, email: &str, username: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/1/users",
            None,
            Some(json!({ "email": email, "username": username, "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(app, form_request("/api/1/admins/token", ADMIN_EMAIL, ADMIN_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

async fn create_blog(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/1/blogs",
            Some(token),
            Some(json!({ "title": title, "content": "Lorem ipsum" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert!(response.headers().contains_key("x-request-id"));

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _) = spawn_app().await;

    let token = register(&app, "a@x.com", "alice").await;
    assert!(!token.is_empty());

    let (status, body) = send(&app, form_request("/api/1/token", "a@x.com", "password123")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "bearer");

    let (wrong_pw, wrong_body) = send(&app, form_request("/api/1/token", "a@x.com", "nope-nope")).await;
    let (unknown, unknown_body) =
        send(&app, form_request("/api/1/token", "ghost@x.com", "password123")).await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], unknown_body["error"]);

    // User credentials do not work on the admin login.
    let (status, _) = send(&app, form_request("/api/1/admins/token", "a@x.com", "password123")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_conflicts_and_validation() {
    let (app, _) = spawn_app().await;
    register(&app, "a@x.com", "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/1/users",
            None,
            Some(json!({ "email": "a@x.com", "username": "other", "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/1/users",
            None,
            Some(json!({ "email": "b@x.com", "username": "alice", "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already taken");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/1/users",
            None,
            Some(json!({ "email": "not-an-email", "username": "carol", "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let (app, shared) = spawn_app().await;
    let token = register(&app, "a@x.com", "alice").await;

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/users/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(Method::GET, "/api/1/users/me", Some("garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password_hash").is_none());

    let identity = Identity {
        id: body["data"]["id"].as_i64().unwrap() as i32,
        email: "a@x.com".to_string(),
        role: Role::User,
    };
    let expired = shared
        .tokens
        .issue_at(
            &identity,
            chrono::Duration::minutes(30),
            chrono::Utc::now() - chrono::Duration::minutes(31),
        )
        .unwrap();
    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/1/users/me", Some(&expired), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn test_update_me_and_change_password() {
    let (app, _) = spawn_app().await;
    let token = register(&app, "a@x.com", "alice").await;
    register(&app, "b@x.com", "bob").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/1/users/me",
            Some(&token),
            Some(json!({ "username": "alice2" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice2");
    assert_eq!(body["data"]["email"], "a@x.com");

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/1/users/me",
            Some(&token),
            Some(json!({ "email": "b@x.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/1/users/me/password",
            Some(&token),
            Some(json!({ "current_password": "password123", "new_password": "brand-new-pw" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, form_request("/api/1/token", "a@x.com", "brand-new-pw")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blog_ownership() {
    let (app, _) = spawn_app().await;
    let alice = register(&app, "a@x.com", "alice").await;
    let bob = register(&app, "b@x.com", "bob").await;

    let blog_id = create_blog(&app, &alice, "Alice's post").await;
    let uri = format!("/api/1/blogs/{blog_id}");

    let (status, body) = send(&app, json_request(Method::GET, &uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Alice's post");

    let (status, _) = send(&app, json_request(Method::GET, &uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&bob),
            Some(json!({ "title": "Hijacked", "content": "x" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/blogs", Some(&bob), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({ "title": "Edited", "content": "New body" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Edited");

    let (status, _) = send(&app, json_request(Method::DELETE, &uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);

    // Gone for everyone, owner included.
    for token in [&alice, &bob] {
        let (status, body) = send(&app, json_request(Method::GET, &uri, Some(token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Blog not found");
    }
}

#[tokio::test]
async fn test_malformed_id_is_a_json_validation_error() {
    let (app, _) = spawn_app().await;
    let alice = register(&app, "a@x.com", "alice").await;
    let admin = admin_token(&app).await;

    for (uri, token) in [
        ("/api/1/blogs/abc", &alice),
        ("/api/1/blogs/99999999999", &alice),
        ("/api/1/users/abc", &admin),
    ] {
        let (status, body) = send(&app, json_request(Method::GET, uri, Some(token.as_str()), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/1/blogs/not-a-number",
            Some(&alice),
            Some(json!({ "title": "T", "content": "C" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_deleted_user_token_is_not_found() {
    let (app, shared) = spawn_app().await;
    let token = register(&app, "a@x.com", "alice").await;
    let blog_id = create_blog(&app, &token, "Soon gone").await;

    let (status, _) = send(&app, json_request(Method::DELETE, "/api/1/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    assert!(shared.store.get_blog(blog_id as i32).await.unwrap().is_none());
}

#[tokio::test]
async fn test_role_separation() {
    let (app, _) = spawn_app().await;
    let user = register(&app, "a@x.com", "alice").await;
    let admin = admin_token(&app).await;

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/admins/me", Some(&user), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/admins", Some(&user), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/users/me", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/blogs", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/admins/me", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn test_admin_manages_users_and_admins() {
    let (app, shared) = spawn_app().await;
    let user = register(&app, "a@x.com", "alice").await;
    let blog_id = create_blog(&app, &user, "Owned").await;
    let admin = admin_token(&app).await;

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/admins/users", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    let user_id = users[0]["id"].as_i64().unwrap();
    let user_uri = format!("/api/1/users/{user_id}");

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &user_uri,
            Some(&admin),
            Some(json!({ "email": "renamed@x.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "renamed@x.com");

    let (status, _) = send(&app, json_request(Method::GET, "/api/1/users/9999", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, json_request(Method::DELETE, &user_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(shared.store.get_blog(blog_id as i32).await.unwrap().is_none());

    let (status, _) = send(&app, json_request(Method::GET, &user_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/1/admins",
            Some(&admin),
            Some(json!({ "email": "second@quill.dev", "username": "second", "password": "password123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(&app, json_request(Method::GET, "/api/1/admins", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        form_request("/api/1/admins/token", "second@quill.dev", "password123"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
