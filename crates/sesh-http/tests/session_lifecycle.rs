//! Login, logout and restore against a mock API server.

mod common;

use common::{bearer, client, config, jwt, logged_in_store, session_response};
use serde_json::json;
use sesh_core::error::AuthError;
use sesh_core::{AccessToken, CredentialStore, Credentials, Error};
use sesh_http::{AuthStatus, Client, ClientConfig, DEFAULT_USER_AGENT};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;
    let token = jwt(7, Some("admin"), "t1");

    Mock::given(method("POST"))
        .and(path("/session/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(body_json(json!({
            "login": "ann@example.com",
            "password": "secret123"
        })))
        .respond_with(session_response(&token, "R1"))
        .expect(1)
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    let client = client(&server, &store);
    let state = client
        .login(&Credentials::new("ann@example.com", "secret123"))
        .await
        .unwrap();

    assert_eq!(state.user_id(), 7);
    assert_eq!(state.role(), "admin");
    assert_eq!(state.user.user_name.as_deref(), Some("ann"));
    assert_eq!(client.status(), AuthStatus::Authenticated);

    assert_eq!(store.access_token().unwrap(), Some(AccessToken::new(&token)));
    let user = store.user().unwrap().unwrap();
    assert_eq!(user.email.as_deref(), Some("ann@example.com"));
    assert_eq!(user.user_id, Some(7));
    assert_eq!(store.session().unwrap().unwrap()["refresh_token"], "R1");
}

#[tokio::test]
async fn test_login_defaults_role() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/"))
        .respond_with(session_response(&jwt(3, None, "t1"), "R1"))
        .mount(&server)
        .await;

    let client = client(&server, &CredentialStore::in_memory());
    let state = client
        .login(&Credentials::new("bob", "pw"))
        .await
        .unwrap();

    assert_eq!(state.role(), "user");
    assert_eq!(state.user.user_name.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_login_unknown_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/"))
        .respond_with(ResponseTemplate::new(200).set_body_json("This login is not registered"))
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    let client = client(&server, &store);
    let err = client
        .login(&Credentials::new("nobody@example.com", "pw"))
        .await
        .unwrap_err();

    match err {
        Error::Auth(AuthError::InvalidCredentials(message)) => {
            assert_eq!(message, "This login is not registered");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!store.is_authenticated().unwrap());
    assert_eq!(store.user().unwrap(), None);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Wrong password"})))
        .mount(&server)
        .await;

    let client = client(&server, &CredentialStore::in_memory());
    let err = client
        .login(&Credentials::new("ann@example.com", "nope"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Wrong password"));
    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials(_))));
    assert_eq!(client.status(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_login_with_undecodable_token_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/"))
        .respond_with(session_response("opaque-token", "R1"))
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    let client = client(&server, &store);
    let err = client
        .login(&Credentials::new("ann@example.com", "pw"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::MalformedToken { .. })));
    assert_eq!(store.access_token().unwrap(), None);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_closes_server_session() {
    let server = MockServer::start().await;
    let token = jwt(1, None, "t1");

    Mock::given(method("DELETE"))
        .and(path("/session/"))
        .and(header("authorization", bearer(&token).as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store(&token, "R1");
    let client = client(&server, &store);
    let mut status = client.subscribe();

    client.logout().await;

    assert!(!store.is_authenticated().unwrap());
    status.changed().await.unwrap();
    assert_eq!(*status.borrow(), AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/session/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store(&jwt(1, None, "t1"), "R1");
    let client = client(&server, &store);
    client.logout().await;

    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert_eq!(store.session().unwrap(), None);
    assert_eq!(store.user().unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_when_server_unreachable() {
    let server = MockServer::start().await;
    let unreachable: ClientConfig = config(&server);
    drop(server);

    let store = logged_in_store(&jwt(1, None, "t1"), "R1");
    let client = Client::new(unreachable, store.clone()).unwrap();
    client.logout().await;

    assert!(!store.is_authenticated().unwrap());
    assert_eq!(client.status(), AuthStatus::Unauthenticated);
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_after_login_in_new_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/"))
        .respond_with(session_response(&jwt(42, Some("editor"), "t1"), "R1"))
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    client(&server, &store)
        .login(&Credentials::new("eve@example.com", "pw"))
        .await
        .unwrap();

    let restarted = client(&server, &store);
    assert_eq!(restarted.status(), AuthStatus::Authenticated);
    let state = restarted.restore().unwrap();
    assert_eq!(state.user_id(), 42);
    assert_eq!(state.role(), "editor");
    assert_eq!(state.user.email.as_deref(), Some("eve@example.com"));

    // Restoring is local only.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
