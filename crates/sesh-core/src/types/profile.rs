//! User descriptor and restored session state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claims::Claims;

/// Role assumed when neither the token nor the stored profile names one.
pub const DEFAULT_ROLE: &str = "user";

/// The persisted description of the logged-in user.
///
/// Only `user_id` and `user_role` have meaning to the client; any other
/// fields written by collaborators are kept in `extra` and survive a
/// load/save round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Overwrite id and role with freshly decoded claims.
    ///
    /// The token wins for the id. For the role the token wins when it names
    /// one, then the stored role, then [`DEFAULT_ROLE`].
    pub fn merge_claims(&mut self, claims: &Claims) {
        self.user_id = Some(claims.user_id);
        self.user_role = claims
            .user_role
            .clone()
            .or_else(|| self.user_role.take())
            .or_else(|| Some(DEFAULT_ROLE.to_string()));
    }

    /// The effective role.
    pub fn role(&self) -> &str {
        self.user_role.as_deref().unwrap_or(DEFAULT_ROLE)
    }
}

/// An authenticated session as seen by collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// The user descriptor, with id and role taken from the token.
    pub user: UserProfile,
    /// The claims decoded from the current access token.
    pub claims: Claims,
}

impl SessionState {
    pub fn new(mut user: UserProfile, claims: Claims) -> Self {
        user.merge_claims(&claims);
        Self { user, claims }
    }

    pub fn user_id(&self) -> i64 {
        self.claims.user_id
    }

    pub fn role(&self) -> &str {
        self.user.role()
    }
}
