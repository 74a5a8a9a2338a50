use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use postbox_api::{AppStateInner, router};
use postbox_db::Database;

fn app() -> Router {
    router(AppStateInner::new(Database::open_in_memory().unwrap()))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn setup_user(app: &Router, username: &str) {
    let (status, _) = call(
        app,
        Method::POST,
        "/users/",
        Some(json!({ "name": "Alice", "username": username })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn send(app: &Router, sender: &str, recipient: &str, content: &str) -> (StatusCode, Value) {
    call(
        app,
        Method::POST,
        &format!("/users/{recipient}/messages/"),
        Some(json!({ "sender_username": sender, "content": content })),
    )
    .await
}

#[tokio::test]
async fn create_user_succeeds() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/users/",
        Some(json!({ "name": "Alice", "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Message": "User successfully created" }));

    let (status, body) = call(&app, Method::GET, "/users/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn create_user_twice_is_400() {
    let app = app();
    setup_user(&app, "alice").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/users/",
        Some(json!({ "name": "Alice", "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already exists.");
}

#[tokio::test]
async fn create_user_with_empty_username_is_400() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/users/",
        Some(json!({ "name": "Alice", "username": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username cannot be an empty string.");
}

#[tokio::test]
async fn send_message_returns_the_record() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;

    let (status, body) = send(&app, "alice", "bob", "hej hej").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].is_string());
    assert!(body["timestamp"].is_string());
    assert_eq!(body["content"], "hej hej");
    assert_eq!(body["sender_username"], "alice");
    assert_eq!(body["recipient_username"], "bob");
}

#[tokio::test]
async fn send_message_to_missing_recipient_is_404() {
    let app = app();
    setup_user(&app, "alice").await;
    let (status, body) = send(&app, "alice", "bob", "hej hej").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Recipient does not exist.");
}

#[tokio::test]
async fn send_message_from_missing_sender_is_404() {
    let app = app();
    setup_user(&app, "bob").await;
    let (status, body) = send(&app, "alice", "bob", "hej hej").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Sender does not exist.");
}

#[tokio::test]
async fn get_all_messages_in_order() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;
    send(&app, "alice", "bob", "trevlig att träffas").await;

    let (status, body) = call(&app, Method::GET, "/users/bob/messages/", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hej hej");
    assert_eq!(messages[1]["content"], "trevlig att träffas");
}

#[tokio::test]
async fn get_all_messages_for_missing_user_is_404() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/users/bob/messages/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User does not exist.");
}

#[tokio::test]
async fn get_new_messages_between_sends() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;
    send(&app, "alice", "bob", "trevlig att träffas").await;

    let (status, body) = call(&app, Method::GET, "/users/bob/messages/new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    send(&app, "alice", "bob", "vi ses").await;
    let (status, body) = call(&app, Method::GET, "/users/bob/messages/new", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "vi ses");
}

#[tokio::test]
async fn get_new_messages_when_none_left() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;

    call(&app, Method::GET, "/users/bob/messages/new", None).await;
    let (status, body) = call(&app, Method::GET, "/users/bob/messages/new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Message": "No new messages." }));
}

#[tokio::test]
async fn get_single_message() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    let (_, sent) = send(&app, "alice", "bob", "hej hej").await;
    let id = sent["id"].as_str().unwrap();

    let (status, body) = call(&app, Method::GET, &format!("/users/bob/messages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, sent);

    let (status, _) = call(&app, Method::GET, &format!("/users/alice/messages/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_message_succeeds() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;
    send(&app, "alice", "bob", "trevlig att träffas").await;
    let (_, sent) = send(&app, "alice", "bob", "vi ses").await;
    let id = sent["id"].as_str().unwrap();

    let (status, body) =
        call(&app, Method::DELETE, &format!("/users/bob/messages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Message": "Message deleted" }));

    let (_, body) = call(&app, Method::GET, "/users/bob/messages/", None).await;
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m["id"] != id));
}

#[tokio::test]
async fn delete_message_for_missing_user_is_404() {
    let app = app();
    let (status, body) = call(&app, Method::DELETE, "/users/bob/messages/randomid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User does not exist.");
}

#[tokio::test]
async fn delete_missing_message_is_404() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;

    let (status, body) = call(&app, Method::DELETE, "/users/bob/messages/randomid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No message with this message id exists.");
}

#[tokio::test]
async fn delete_multiple_messages() {
    let app = app();
    setup_user(&app, "alice").await;
    setup_user(&app, "bob").await;
    send(&app, "alice", "bob", "hej hej").await;
    let (_, first) = send(&app, "alice", "bob", "trevlig att träffas").await;
    let (_, second) = send(&app, "alice", "bob", "vi ses").await;

    let (status, body) = call(
        &app,
        Method::DELETE,
        "/users/bob/messages/",
        Some(json!({ "message_ids": [first["id"], second["id"], "missing"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Message": "Messages deleted" }));

    let (_, body) = call(&app, Method::GET, "/users/bob/messages/", None).await;
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "hej hej");
}
