//! Identity claims carried inside an access token.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::error::AuthError;

/// Identity claims decoded from the middle part of an access token.
///
/// Decoding trusts the token's structure only. It is enough to restore who
/// the user is locally; authorization decisions stay with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user's numeric id.
    pub user_id: i64,
    /// The user's role (`user`, `author`, `admin`), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl Claims {
    /// Decode the claims of a three-part `header.payload.signature` token.
    pub fn decode(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three dot-separated parts"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| malformed(format!("payload is not base64url: {e}")))?;

        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| malformed(format!("payload is not JSON: {e}")))?;

        let user_id = payload
            .get("user_id")
            .and_then(integer_claim)
            .ok_or_else(|| malformed("missing user_id claim"))?;

        let user_role = payload
            .get("user_role")
            .and_then(Value::as_str)
            .filter(|role| !role.is_empty())
            .map(str::to_string);

        Ok(Self { user_id, user_role })
    }
}

/// Ids are issued as numbers by some servers and as strings by others.
fn integer_claim(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn malformed(reason: impl Into<String>) -> crate::Error {
    AuthError::MalformedToken {
        reason: reason.into(),
    }
    .into()
}
