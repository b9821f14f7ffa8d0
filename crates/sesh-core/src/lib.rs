//! sesh-core - Core types for the sesh session-keeping API client.

pub mod claims;
pub mod credentials;
pub mod error;
pub mod storage;
pub mod store;
pub mod tokens;
pub mod types;

pub use claims::Claims;
pub use credentials::Credentials;
pub use error::Error;
pub use storage::{MemoryStorage, Slot, SlotStorage};
pub use store::CredentialStore;
pub use tokens::{AccessToken, RefreshToken};
pub use types::{ApiUrl, SessionState, UserProfile};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
