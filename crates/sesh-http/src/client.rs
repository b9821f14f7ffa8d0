//! The client facade.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use sesh_core::error::AuthError;
use sesh_core::{AccessToken, CredentialStore, Credentials, Result, SessionState, UserProfile};

use crate::bootstrap;
use crate::config::ClientConfig;
use crate::coordinator::{HttpRefresher, RefreshCoordinator};
use crate::dispatcher::Dispatcher;
use crate::endpoints::{self, LoginRequest, SessionGrant, SessionInfo};
use crate::logout::{AuthStatus, LogoutHandler};
use crate::request::{ApiRequest, ApiResponse};

/// An API client that keeps its session alive.
///
/// A request rejected with 401 triggers one shared token refresh and is then
/// replayed once with the new token. If the refresh fails the session ends
/// and the refresh error is returned.
///
/// Clones share the credential store, the refresh coordinator and the
/// status channel.
#[derive(Debug, Clone)]
pub struct Client {
    dispatcher: Dispatcher,
    coordinator: RefreshCoordinator,
    logout: LogoutHandler,
}

impl Client {
    pub fn new(config: ClientConfig, store: CredentialStore) -> Result<Self> {
        let dispatcher = Dispatcher::new(&config, store.clone())?;
        let logout = LogoutHandler::new(store.clone());
        let refresher = Arc::new(HttpRefresher::new(dispatcher.clone()));
        let coordinator = RefreshCoordinator::new(store, refresher, logout.clone());

        Ok(Self {
            dispatcher,
            coordinator,
            logout,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        self.dispatcher.store()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send a request, recovering from an expired access token.
    ///
    /// The replayed response is returned whatever its status, so a second
    /// 401 reaches the caller unchanged.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let sent = self.store().access_token()?;
        let response = self.dispatcher.send_with_token(request, sent.as_ref()).await?;
        if !response.is_unauthorized() || !request.is_refreshable() {
            return Ok(response);
        }

        debug!(path = request.path(), "Access token rejected");
        let token = self.coordinator.recover(request, sent.as_ref()).await?;
        self.dispatcher.send_with_token(request, Some(&token)).await
    }

    /// GET `path` and decode a successful JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(&ApiRequest::get(path))
            .await?
            .error_for_status()?
            .json()
    }

    /// POST `body` to `path` and decode a successful JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(&ApiRequest::post(path).json(body)?)
            .await?
            .error_for_status()?
            .json()
    }

    /// PUT `body` to `path` and decode a successful JSON response.
    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(&ApiRequest::put(path).json(body)?)
            .await?
            .error_for_status()?
            .json()
    }

    /// DELETE `path`, failing on a non-success status.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(&ApiRequest::delete(path))
            .await?
            .error_for_status()
    }

    /// Log in and persist the new session.
    ///
    /// Nothing is persisted unless the whole exchange succeeds.
    #[instrument(skip(self, credentials), fields(login = credentials.login()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionState> {
        let request = ApiRequest::post(endpoints::SESSION).json(&LoginRequest {
            login: credentials.login(),
            password: credentials.password(),
        })?;
        let response = self.dispatcher.send_with_token(&request, None).await?;

        if response.is_unauthorized() {
            return Err(invalid_credentials(&response).into());
        }
        let response = response.error_for_status()?;
        // Unknown logins are answered with 200 and a bare message.
        if response.header(endpoints::ACCESS_TOKEN_HEADER).is_none() {
            return Err(invalid_credentials(&response).into());
        }

        let grant = SessionGrant::from_response(&response)?;
        let claims = grant.access_token.claims()?;

        let user = UserProfile {
            email: Some(credentials.login().to_string()),
            user_name: Some(credentials.display_name().to_string()),
            ..Default::default()
        };
        let state = SessionState::new(user, claims);

        self.store().save_login(
            &grant.access_token,
            &grant.refresh_token,
            &grant.descriptor,
            &state.user,
        )?;
        self.logout.mark_authenticated();

        info!(user_id = state.user_id(), role = state.role(), "Logged in");
        Ok(state)
    }

    /// End the session.
    ///
    /// Tells the server first, best effort; local state is cleared whatever
    /// the server says.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        match self.dispatcher.send(&ApiRequest::delete(endpoints::SESSION)).await {
            Ok(response) if response.status().is_success() => {
                debug!("Server session closed");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Server refused to close the session");
            }
            Err(e) => {
                warn!(error = %e, "Could not reach server to close the session");
            }
        }
        self.logout.invalidate();
    }

    /// Restore the session persisted by an earlier process.
    pub fn restore(&self) -> Option<SessionState> {
        bootstrap::restore(self.store(), &self.logout)
    }

    /// Refresh the access token now, joining any refresh already running.
    pub async fn refresh(&self) -> Result<AccessToken> {
        self.coordinator.refresh_now().await
    }

    /// Sessions of `user_id`.
    pub async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionInfo>> {
        self.get_json(&endpoints::sessions_path(user_id)).await
    }

    /// Sessions of `user_id` with their refresh tokens. Admin only.
    pub async fn list_sessions_admin(&self, user_id: i64) -> Result<Vec<SessionInfo>> {
        self.get_json(&endpoints::admin_sessions_path(user_id)).await
    }

    /// The current authentication status.
    pub fn status(&self) -> AuthStatus {
        self.logout.status()
    }

    /// Watch for login and logout.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.logout.subscribe()
    }
}

fn invalid_credentials(response: &ApiResponse) -> AuthError {
    AuthError::InvalidCredentials(
        response
            .detail()
            .unwrap_or_else(|| "login rejected".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_logged_out_with_empty_store() {
        let client = Client::new(ClientConfig::default(), CredentialStore::in_memory()).unwrap();
        assert_eq!(client.status(), AuthStatus::Unauthenticated);
        assert!(client.restore().is_none());
    }

    #[test]
    fn clones_share_state() {
        let client = Client::new(ClientConfig::default(), CredentialStore::in_memory()).unwrap();
        let other = client.clone();
        client
            .store()
            .save_refresh(
                &AccessToken::new("T"),
                &sesh_core::RefreshToken::new("R"),
                None,
            )
            .unwrap();
        assert!(other.store().is_authenticated().unwrap());
    }
}
