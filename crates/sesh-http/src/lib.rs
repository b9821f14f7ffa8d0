//! sesh-http - HTTP client with single-flight token refresh.
//!
//! ```no_run
//! # async fn demo() -> sesh_core::Result<()> {
//! use sesh_core::{CredentialStore, Credentials};
//! use sesh_http::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::default(), CredentialStore::in_memory())?;
//! client.login(&Credentials::new("ann@example.com", "secret")).await?;
//! let news: serde_json::Value = client.get_json("/news/").await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
mod client;
mod config;
pub mod coordinator;
mod dispatcher;
pub mod endpoints;
mod logout;
mod request;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use coordinator::{HttpRefresher, Phase, RefreshCoordinator, RefreshedSession, TokenRefresher};
pub use dispatcher::Dispatcher;
pub use endpoints::SessionInfo;
pub use logout::{AuthStatus, LogoutHandler};
pub use request::{ApiRequest, ApiResponse};
pub use reqwest::{Method, StatusCode};
