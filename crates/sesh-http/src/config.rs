//! Client configuration.

use std::time::Duration;

use sesh_core::ApiUrl;

/// User agent sent when none is configured.
///
/// The server binds each session to the user agent that created it, so this
/// must stay identical between login and refresh.
pub const DEFAULT_USER_AGENT: &str = concat!("sesh/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API.
    pub base_url: ApiUrl,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout. Applies to refresh calls too; an expired timeout
    /// surfaces as a transport error.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(ApiUrl::default())
    }
}
