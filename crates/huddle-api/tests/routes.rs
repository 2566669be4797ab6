use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use huddle_api::auth::AppStateInner;
use huddle_db::MemoryStore;
use huddle_engine::{Engine, JwtIdentity};

fn app() -> Router {
    let identity = Arc::new(JwtIdentity::new("route-test-secret"));
    let engine = Engine::new(Arc::new(MemoryStore::new()), identity.clone());
    huddle_api::router(Arc::new(AppStateInner { engine, identity }))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, first: &str, last: &str) -> (i64, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{}@example.com", first.to_lowercase()),
            "password": "hunter22",
            "name_first": first,
            "name_last": last,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["auth_user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn register_then_login() {
    let app = app();
    let (user_id, _) = register(&app, "Alice", "Smith").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth_user_id"].as_i64(), Some(user_id));

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "bob@example.com",
            "password": "123",
            "name_first": "Bob",
            "name_last": "Builder",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_or_bad_token_is_forbidden() {
    let app = app();
    let (status, _) = call(&app, Method::GET, "/notifications", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/notifications", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn send_edit_and_page_messages() {
    let app = app();
    let (_, token) = register(&app, "Alice", "Smith").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "general", "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let channel_id = body["channel_id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&token),
        Some(json!({ "channel_id": channel_id, "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message_id = body["message_id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/messages/{}", message_id),
        Some(&token),
        Some(json!({ "message": "hello again" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/messages/{}/react", message_id),
        Some(&token),
        Some(json!({ "react_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, page) = call(
        &app,
        Method::GET,
        &format!("/channels/{}/messages?start=0", channel_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["end"], json!(-1));
    assert_eq!(page["messages"][0]["message"], json!("hello again"));
    assert_eq!(page["messages"][0]["reacts"][0]["react_id"], json!(1));
    assert_eq!(page["messages"][0]["reacts"][0]["is_this_user_reacted"], json!(true));

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/messages/{}", message_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/messages/{}", message_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn both_targets_set_is_bad_request() {
    let app = app();
    let (_, token) = register(&app, "Alice", "Smith").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&token),
        Some(json!({ "channel_id": 1, "dm_id": 1, "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some("not-a-token"),
        Some(json!({ "channel_id": 1, "dm_id": 1, "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn outsiders_cannot_post_to_a_dm() {
    let app = app();
    let (_, alice) = register(&app, "Alice", "Smith").await;
    let (bob_id, bob) = register(&app, "Bob", "Builder").await;
    let (_, carol) = register(&app, "Carol", "Danvers").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/dms",
        Some(&alice),
        Some(json!({ "u_ids": [bob_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let dm_id = body["dm_id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&carol),
        Some(json!({ "dm_id": dm_id, "message": "let me in" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::GET, "/notifications", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"][0]["dm_id"].as_i64(), Some(dm_id));
    assert_eq!(body["notifications"][0]["channel_id"], json!(-1));
    assert_eq!(
        body["notifications"][0]["notification_message"],
        json!("alicesmith added you to alicesmith, bobbuilder")
    );
}

#[tokio::test]
async fn standup_status_round_trip() {
    let app = app();
    let (_, token) = register(&app, "Alice", "Smith").await;
    let (_, body) = call(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "standups", "is_public": true })),
    )
    .await;
    let channel_id = body["channel_id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/standup/active?channel_id={}", channel_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "is_active": false, "time_finish": null }));

    let (status, body) = call(
        &app,
        Method::POST,
        "/standup/start",
        Some(&token),
        Some(json!({ "channel_id": channel_id, "length": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let time_finish = body["time_finish"].as_i64().unwrap();

    let (_, body) = call(
        &app,
        Method::GET,
        &format!("/standup/active?channel_id={}", channel_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["is_active"], json!(true));
    assert_eq!(body["time_finish"].as_i64(), Some(time_finish));

    let (status, _) = call(
        &app,
        Method::POST,
        "/standup/send",
        Some(&token),
        Some(json!({ "channel_id": channel_id, "message": "shipping" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_requests_get_the_json_error_body() {
    let app = app();
    let (_, token) = register(&app, "Alice", "Smith").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/channels")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().is_some());

    let (status, body) = call(
        &app,
        Method::POST,
        "/channels",
        Some(&token),
        Some(json!({ "name": "general" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = call(&app, Method::GET, "/channels/1/messages?start=-1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = call(&app, Method::DELETE, "/messages/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}
