//! The credential store.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::error::StorageError;
use crate::storage::{MemoryStorage, Slot, SlotStorage};
use crate::tokens::{AccessToken, RefreshToken};
use crate::types::UserProfile;

/// Typed access to the persisted session slots.
///
/// Clones share the same backend. Tokens are only ever written in pairs and
/// cleared together, so a reader never finds an access token without its
/// refresh token (or the reverse) outside of a refresh in progress.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    storage: Arc<dyn SlotStorage>,
}

impl CredentialStore {
    /// Create a store over the given backend.
    pub fn new(storage: impl SlotStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Create a store over a shared backend.
    pub fn from_shared(storage: Arc<dyn SlotStorage>) -> Self {
        Self { storage }
    }

    /// A store that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.storage.load(Slot::Token)?.map(AccessToken::new))
    }

    pub fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.storage.load(Slot::RefreshToken)?.map(RefreshToken::new))
    }

    /// The server-issued session descriptor, stored verbatim.
    pub fn session(&self) -> Result<Option<Value>> {
        self.load_json(Slot::Session)
    }

    /// The persisted user descriptor.
    pub fn user(&self) -> Result<Option<UserProfile>> {
        self.load_json(Slot::User)
    }

    /// True when both tokens are present.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token()?.is_some() && self.refresh_token()?.is_some())
    }

    /// Persist everything produced by a successful login in one batch.
    pub fn save_login(
        &self,
        access: &AccessToken,
        refresh: &RefreshToken,
        session: &Value,
        user: &UserProfile,
    ) -> Result<()> {
        debug!("Saving login state");
        self.storage.store(&[
            (Slot::Token, access.as_str().to_string()),
            (Slot::RefreshToken, refresh.as_str().to_string()),
            (Slot::Session, to_json(session)?),
            (Slot::User, to_json(user)?),
        ])
    }

    /// Persist a rotated token pair (and the descriptor that came with it).
    pub fn save_refresh(
        &self,
        access: &AccessToken,
        refresh: &RefreshToken,
        session: Option<&Value>,
    ) -> Result<()> {
        debug!("Saving refreshed tokens");
        let mut entries = vec![
            (Slot::Token, access.as_str().to_string()),
            (Slot::RefreshToken, refresh.as_str().to_string()),
        ];
        if let Some(session) = session {
            entries.push((Slot::Session, to_json(session)?));
        }
        self.storage.store(&entries)
    }

    /// Remove every slot.
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing credential store");
        self.storage.remove(&Slot::ALL)
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, slot: Slot) -> Result<Option<T>> {
        let Some(raw) = self.storage.load(slot)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::new(format!("slot '{slot}' holds invalid JSON: {e}")).into())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::new(format!("failed to encode slot value: {e}")).into())
}
