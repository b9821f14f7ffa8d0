//! Request and response values passed through the dispatcher.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sesh_core::Result;
use sesh_core::error::{InvalidInputError, ProtocolError, TransportError};

use crate::endpoints;

/// An outbound API call: method, path relative to the base URL, optional JSON body.
///
/// Requests are plain values so that a request rejected with 401 can be
/// issued again unchanged once a new access token is available.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach any serializable value as the JSON body.
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body is not serializable: {}", e),
        })?;
        Ok(self.with_body(value))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Whether a 401 on this request may start a refresh.
    ///
    /// Calls to the session endpoint (login, refresh, logout, session
    /// listings) never do; otherwise a rejected refresh would refresh again.
    pub fn is_refreshable(&self) -> bool {
        !endpoints::is_session_path(&self.path)
    }
}

/// A received HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TransportError::Http {
                message: format!("error decoding response body: {}", e),
            }
            .into()
        })
    }

    /// The server's error message.
    ///
    /// Understands `{"detail": "..."}`, structured `detail` values (rendered
    /// as JSON), and bare JSON strings.
    pub fn detail(&self) -> Option<String> {
        match serde_json::from_slice::<Value>(&self.body).ok()? {
            Value::String(message) => Some(message),
            Value::Object(mut map) => match map.remove("detail")? {
                Value::String(message) => Some(message),
                other => Some(other.to_string()),
            },
            _ => None,
        }
    }

    /// Turn a non-success status into [`ProtocolError`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ProtocolError::new(self.status.as_u16(), self.detail()).into())
        }
    }
}
