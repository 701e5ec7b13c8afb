//! Wire-level tests for session handling on outgoing requests.
//!
//! These exercise the full path: session store -> authenticator -> HTTP
//! client -> server, asserting on the headers an actual server receives.

use mockito::{Matcher, Server, ServerGuard};
use satchel::{ApiClient, ApiError, FileStorage, MemoryStorage, SessionStore};
use serde_json::Value;

fn fresh_session() -> SessionStore {
    SessionStore::open(MemoryStorage::new()).unwrap()
}

fn client_for(server: &ServerGuard, session: SessionStore) -> ApiClient {
    ApiClient::new(server.url())
        .unwrap()
        .with_session(session)
}

#[tokio::test]
async fn test_unauthenticated_request_omits_authorization_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/widgets")
        .match_header("authorization", Matcher::Missing)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let client = client_for(&server, fresh_session());
    let body: Value = client.get("/widgets").await.unwrap();

    mock.assert_async().await;
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_token_is_sent_verbatim() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/widgets")
        .match_header("authorization", "tok-123.SIG==")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let session = fresh_session();
    session.set_token("tok-123.SIG==").unwrap();
    let client = client_for(&server, session);

    let _: Value = client.get("/widgets").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_carries_token_and_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/widgets")
        .match_header("authorization", "tok-post")
        .match_body(Matcher::Json(serde_json::json!({"name": "gadget"})))
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7}"#)
        .create_async()
        .await;

    let session = fresh_session();
    session.set_token("tok-post").unwrap();
    let client = client_for(&server, session);

    let created: Value = client
        .post("/widgets", &serde_json::json!({"name": "gadget"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created["id"], 7);
}

#[tokio::test]
async fn test_cleared_session_sends_unauthenticated() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/widgets")
        .match_header("authorization", Matcher::Missing)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let session = fresh_session();
    session.set_token("soon-gone").unwrap();
    session.clear_token().unwrap();
    let client = client_for(&server, session);

    let _: Value = client.get("/widgets").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_change_applies_to_the_next_request() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/first")
        .match_header("authorization", "token-a")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/second")
        .match_header("authorization", "token-b")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let session = fresh_session();
    let client = client_for(&server, session.clone());

    session.set_token("token-a").unwrap();
    let _: Value = client.get("/first").await.unwrap();

    session.set_token("token-b").unwrap();
    let _: Value = client.get("/second").await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let session = SessionStore::open(FileStorage::new(dir.path())).unwrap();
        session.set_token("persisted-tok").unwrap();
    }

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/widgets")
        .match_header("authorization", "persisted-tok")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let rehydrated = SessionStore::open(FileStorage::new(dir.path())).unwrap();
    let client = client_for(&server, rehydrated);

    let _: Value = client.get("/widgets").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_response_maps_to_typed_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/widgets")
        .with_status(401)
        .with_body("token expired")
        .create_async()
        .await;

    let client = client_for(&server, fresh_session());
    let err = client.get::<Value>("/widgets").await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_rate_limited_requests_retry_then_give_up() {
    let mut server = Server::new_async().await;
    // Initial attempt plus three retries.
    let mock = server
        .mock("GET", "/widgets")
        .with_status(429)
        .expect(4)
        .create_async()
        .await;

    let client = client_for(&server, fresh_session());
    let err = client.get::<Value>("/widgets").await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::RateLimited)
    ));
}
