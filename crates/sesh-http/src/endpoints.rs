//! Session endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sesh_core::error::AuthError;
use sesh_core::{AccessToken, RefreshToken, Result};

use crate::request::ApiResponse;

// ============================================================================
// Paths and headers
// ============================================================================

/// The session endpoint: POST logs in, PUT refreshes, DELETE logs out.
pub const SESSION: &str = "/session/";

/// Response header carrying a newly issued access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-jwt";

/// Sessions of one user, as seen by that user.
pub fn sessions_path(user_id: i64) -> String {
    format!("/session/{}", user_id)
}

/// Sessions of one user including refresh tokens (admin only).
pub fn admin_sessions_path(user_id: i64) -> String {
    format!("/session/admin/{}", user_id)
}

/// True for any path under the session endpoint.
pub fn is_session_path(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path == "session" || path.starts_with("session/")
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

/// Request body for refresh.
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// One entry of a session listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: i64,
    pub user_agent: String,
    pub refresh_token_expiretime: String,
    /// Only present in the admin listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Tokens and descriptor issued by a successful login or refresh.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    /// The response body, kept verbatim as the session descriptor.
    pub descriptor: Value,
}

impl SessionGrant {
    /// Extract the grant from a successful session response.
    ///
    /// The access token travels in the [`ACCESS_TOKEN_HEADER`] header, the
    /// refresh token in the JSON body.
    pub fn from_response(response: &ApiResponse) -> Result<Self> {
        let access = response
            .header(ACCESS_TOKEN_HEADER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        let descriptor: Value = serde_json::from_slice(response.body()).map_err(|e| {
            AuthError::MalformedSession {
                reason: format!("body is not JSON: {}", e),
            }
        })?;

        let refresh = descriptor
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MalformedSession {
                reason: "no refresh_token in body".to_string(),
            })?;

        Ok(Self {
            access_token: AccessToken::new(access),
            refresh_token: RefreshToken::new(refresh),
            descriptor,
        })
    }
}
