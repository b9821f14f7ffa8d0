//! Request dispatcher: sends API requests with the current access token.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::{debug, instrument, trace};

use sesh_core::error::{Error, InvalidInputError, TransportError};
use sesh_core::{AccessToken, ApiUrl, CredentialStore, Result};

use crate::config::ClientConfig;
use crate::request::{ApiRequest, ApiResponse};

/// Map a reqwest failure onto the transport error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}

/// Issues requests against the API base URL.
///
/// Every HTTP response comes back as an [`ApiResponse`] regardless of its
/// status; only failures to get a response at all are errors. Deciding what
/// a 401 means is left to the caller.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: ApiUrl,
    store: CredentialStore,
}

impl Dispatcher {
    /// Create a dispatcher reading access tokens from `store`.
    pub fn new(config: &ClientConfig, store: CredentialStore) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            store,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Send a request, attaching the stored access token if there is one.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let token = self.store.access_token()?;
        self.send_with_token(request, token.as_ref()).await
    }

    /// Send a request with an explicit access token (or none).
    #[instrument(skip(self, request, token), fields(method = %request.method(), path = request.path(), authed = token.is_some()))]
    pub async fn send_with_token(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        let url = self.base_url.endpoint(request.path());
        debug!(%url, "Dispatching request");

        let mut builder = self.client.request(request.method().clone(), &url);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, bearer_header(token)?);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;

        trace!(%status, bytes = body.len(), "Received response");
        Ok(ApiResponse::new(status, headers, body))
    }
}

fn bearer_header(token: &AccessToken) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| InvalidInputError::Header {
        name: AUTHORIZATION.to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}
