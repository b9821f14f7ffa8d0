//! Error types for the sesh client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, input validation and storage errors.
//!
//! Every variant is `Clone`: a single failed refresh is handed to every
//! request that was waiting on it.

use std::fmt;
use thiserror::Error;

/// The unified error type for sesh operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, malformed HTTP).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (bad login, failed refresh, broken tokens).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success responses from the API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (bad base URL, unusable header value).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Persisted session state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error (body decoding, redirect loops, ...).
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The server refused the login and password.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A refresh was needed but no refresh token is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The server rejected the refresh token.
    #[error("refresh rejected with HTTP {status}{}", detail_suffix(.detail))]
    RefreshRejected { status: u16, detail: Option<String> },

    /// A session response did not carry a new access token.
    #[error("server response carried no access token")]
    MissingAccessToken,

    /// A session response body was missing fields or was not JSON.
    #[error("malformed session response: {reason}")]
    MalformedSession { reason: String },

    /// An access token could not be decoded into identity claims.
    #[error("malformed access token: {reason}")]
    MalformedToken { reason: String },

    /// The task driving the refresh went away before it settled.
    #[error("refresh was interrupted before it completed")]
    RefreshInterrupted,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Non-success response from the API.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// The server's `detail` message, if it sent one.
    pub detail: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A value cannot be sent as an HTTP header.
    #[error("invalid header value for '{name}'")]
    Header { name: String },

    /// Generic invalid input.
    #[error("{message}")]
    Other { message: String },
}

/// Persistence errors.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rejected_includes_detail() {
        let err = AuthError::RefreshRejected {
            status: 401,
            detail: Some("Refresh token is invalid".into()),
        };
        assert_eq!(
            err.to_string(),
            "refresh rejected with HTTP 401: Refresh token is invalid"
        );

        let bare = AuthError::RefreshRejected {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.to_string(), "refresh rejected with HTTP 500");
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::new(403, Some("Permission denied".into()));
        assert_eq!(err.to_string(), "HTTP 403: Permission denied");
        assert_eq!(ProtocolError::new(500, None).to_string(), "HTTP 500");
    }
}
