//! Shared helpers for the mock server tests.

#![allow(dead_code)]

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use sesh_core::{AccessToken, ApiUrl, CredentialStore, RefreshToken, UserProfile};
use sesh_http::{Client, ClientConfig};
use wiremock::{MockServer, ResponseTemplate};

/// An unsigned JWT carrying the given identity.
pub fn jwt(user_id: i64, role: Option<&str>, nonce: &str) -> String {
    let mut payload = json!({"user_id": user_id, "jti": nonce});
    if let Some(role) = role {
        payload["user_role"] = json!(role);
    }
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A successful login or refresh response.
pub fn session_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("x-jwt", access)
        .set_body_json(session_body(refresh))
}

pub fn session_body(refresh: &str) -> Value {
    json!({
        "user_id": 1,
        "refresh_token": refresh,
        "refresh_token_expiretime": "2026-12-01T00:00:00",
        "user_agent": sesh_http::DEFAULT_USER_AGENT,
    })
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(ApiUrl::new(server.uri()).unwrap())
}

/// A store holding a logged-in session for user 1.
pub fn logged_in_store(access: &str, refresh: &str) -> CredentialStore {
    let store = CredentialStore::in_memory();
    let user = UserProfile {
        user_id: Some(1),
        user_role: Some("user".into()),
        email: Some("ann@example.com".into()),
        user_name: Some("ann".into()),
        ..Default::default()
    };
    store
        .save_login(
            &AccessToken::new(access),
            &RefreshToken::new(refresh),
            &session_body(refresh),
            &user,
        )
        .unwrap();
    store
}

pub fn client(server: &MockServer, store: &CredentialStore) -> Client {
    Client::new(config(server), store.clone()).unwrap()
}
