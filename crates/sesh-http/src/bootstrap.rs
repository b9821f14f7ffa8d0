//! Session restoration at start-up.

use tracing::{debug, instrument, warn};

use sesh_core::error::AuthError;
use sesh_core::{AccessToken, CredentialStore, Result, SessionState, UserProfile};

use crate::logout::LogoutHandler;

/// Rebuild the authenticated session from persisted state.
///
/// Needs both the access token and the user descriptor; if either is
/// missing the user is simply logged out and nothing is cleared. A session
/// that cannot be refreshed, an undecodable token, an unreadable user
/// descriptor or a failing store all invalidate the session.
///
/// Identity comes from the token: the id always, the role when the token
/// names one. Never touches the network.
#[instrument(skip_all)]
pub fn restore(store: &CredentialStore, logout: &LogoutHandler) -> Option<SessionState> {
    let (token, user) = match load(store) {
        Ok(Some(loaded)) => loaded,
        Ok(None) => {
            debug!("No persisted session");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "Persisted session is unusable");
            logout.invalidate();
            return None;
        }
    };

    match token.claims() {
        Ok(claims) => {
            let state = SessionState::new(user, claims);
            debug!(user_id = state.user_id(), role = state.role(), "Session restored");
            logout.mark_authenticated();
            Some(state)
        }
        Err(e) => {
            warn!(error = %e, "Persisted access token is unusable");
            logout.invalidate();
            None
        }
    }
}

fn load(store: &CredentialStore) -> Result<Option<(AccessToken, UserProfile)>> {
    let Some(token) = store.access_token()? else {
        return Ok(None);
    };
    let Some(user) = store.user()? else {
        return Ok(None);
    };
    if store.refresh_token()?.is_none() {
        return Err(AuthError::MissingRefreshToken.into());
    }
    Ok(Some((token, user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;
    use sesh_core::storage::{MemoryStorage, Slot, SlotStorage};
    use sesh_core::RefreshToken;

    use crate::logout::AuthStatus;

    fn token(payload: serde_json::Value) -> AccessToken {
        AccessToken::new(format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        ))
    }

    fn logged_in(access: &AccessToken, user: &UserProfile) -> CredentialStore {
        let store = CredentialStore::in_memory();
        store
            .save_login(access, &RefreshToken::new("R1"), &json!({}), user)
            .unwrap();
        store
    }

    #[test]
    fn restores_identity_from_token() {
        let user = UserProfile {
            user_id: Some(99),
            user_role: Some("user".into()),
            email: Some("ann@example.com".into()),
            ..Default::default()
        };
        let store = logged_in(&token(json!({"user_id": 7, "user_role": "admin"})), &user);
        let logout = LogoutHandler::new(store.clone());

        let state = restore(&store, &logout).unwrap();
        assert_eq!(state.user_id(), 7);
        assert_eq!(state.user.user_id, Some(7));
        assert_eq!(state.role(), "admin");
        assert_eq!(state.user.email.as_deref(), Some("ann@example.com"));
        assert_eq!(logout.status(), AuthStatus::Authenticated);
    }

    #[test]
    fn keeps_stored_role_when_token_has_none() {
        let user = UserProfile {
            user_role: Some("editor".into()),
            ..Default::default()
        };
        let store = logged_in(&token(json!({"user_id": "12"})), &user);
        let logout = LogoutHandler::new(store.clone());

        let state = restore(&store, &logout).unwrap();
        assert_eq!(state.user_id(), 12);
        assert_eq!(state.role(), "editor");
    }

    #[test]
    fn missing_state_is_left_alone() {
        let storage = MemoryStorage::new();
        storage
            .store(&[(Slot::RefreshToken, "R1".to_string())])
            .unwrap();
        let store = CredentialStore::new(storage);
        let logout = LogoutHandler::new(store.clone());

        assert!(restore(&store, &logout).is_none());
        assert_eq!(
            store.refresh_token().unwrap(),
            Some(RefreshToken::new("R1"))
        );
    }

    #[test]
    fn malformed_token_clears_everything() {
        let store = logged_in(&AccessToken::new("not-a-jwt"), &UserProfile::default());
        let logout = LogoutHandler::new(store.clone());

        assert!(restore(&store, &logout).is_none());
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
        assert_eq!(store.user().unwrap(), None);
        assert_eq!(logout.status(), AuthStatus::Unauthenticated);
    }

    #[test]
    fn missing_refresh_token_clears_everything() {
        let storage = MemoryStorage::new();
        storage
            .store(&[
                (Slot::Token, token(json!({"user_id": 1})).as_str().to_string()),
                (Slot::User, r#"{"user_id":1}"#.to_string()),
            ])
            .unwrap();
        let store = CredentialStore::new(storage);
        let logout = LogoutHandler::new(store.clone());

        assert!(restore(&store, &logout).is_none());
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.user().unwrap(), None);
        assert_eq!(logout.status(), AuthStatus::Unauthenticated);
    }

    #[test]
    fn unreadable_user_clears_everything() {
        let storage = MemoryStorage::new();
        storage
            .store(&[
                (Slot::Token, token(json!({"user_id": 1})).as_str().to_string()),
                (Slot::RefreshToken, "R1".to_string()),
                (Slot::User, "{not json".to_string()),
            ])
            .unwrap();
        let store = CredentialStore::new(storage);
        let logout = LogoutHandler::new(store.clone());

        assert!(restore(&store, &logout).is_none());
        assert!(!store.is_authenticated().unwrap());
    }
}
