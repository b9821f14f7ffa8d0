//! Local session invalidation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use sesh_core::CredentialStore;

/// Whether collaborators should treat the user as logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authenticated,
}

/// Clears persisted session state and tells subscribers about it.
///
/// Invalidation is purely local and idempotent. Telling the server is the
/// caller's business and happens before this runs; its failure never stops
/// the local clear.
#[derive(Debug, Clone)]
pub struct LogoutHandler {
    store: CredentialStore,
    status: Arc<watch::Sender<AuthStatus>>,
}

impl LogoutHandler {
    pub fn new(store: CredentialStore) -> Self {
        let initial = match store.is_authenticated() {
            Ok(true) => AuthStatus::Authenticated,
            _ => AuthStatus::Unauthenticated,
        };
        let (status, _) = watch::channel(initial);

        Self {
            store,
            status: Arc::new(status),
        }
    }

    /// Clear every slot and publish [`AuthStatus::Unauthenticated`].
    pub fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session state");
        }
        self.status.send_replace(AuthStatus::Unauthenticated);
        info!("Session invalidated");
    }

    pub(crate) fn mark_authenticated(&self) {
        self.status.send_replace(AuthStatus::Authenticated);
    }

    /// The last published status.
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }
}
