//! Single-flight token refresh.
//!
//! When a request is rejected with 401 the coordinator makes sure exactly one
//! refresh call is in flight. Callers that hit a 401 while it runs are parked
//! in a FIFO queue and all receive the same outcome once it settles: the new
//! access token, or the refresh error. A failed refresh ends the session.
//!
//! ```text
//!   Idle ──401──▶ Refreshing ──settled──▶ Draining ──queue empty──▶ Idle
//!                   ▲      │
//!                   └─401──┘ (queued)
//! ```
//!
//! Phase changes, enqueueing and draining each happen inside one critical
//! section with no `.await`, so the guarantees hold on a multi-threaded
//! runtime as well as on a single-threaded one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, trace, warn};

use sesh_core::error::AuthError;
use sesh_core::{AccessToken, CredentialStore, RefreshToken, Result};

use crate::dispatcher::Dispatcher;
use crate::endpoints::{self, RefreshRequest, SessionGrant};
use crate::logout::LogoutHandler;
use crate::request::ApiRequest;

/// New tokens issued by a refresh.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub descriptor: Option<Value>,
}

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedSession>;
}

/// Refreshes over HTTP: `PUT /session/` with the refresh token in the body.
#[derive(Debug, Clone)]
pub struct HttpRefresher {
    dispatcher: Dispatcher,
}

impl HttpRefresher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedSession> {
        let request = ApiRequest::put(endpoints::SESSION).json(&RefreshRequest {
            refresh_token: refresh_token.as_str(),
        })?;

        let response = self.dispatcher.send_with_token(&request, None).await?;
        if !response.status().is_success() {
            return Err(AuthError::RefreshRejected {
                status: response.status().as_u16(),
                detail: response.detail(),
            }
            .into());
        }

        let grant = SessionGrant::from_response(&response)?;
        Ok(RefreshedSession {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            descriptor: Some(grant.descriptor),
        })
    }
}

/// Where the coordinator is in a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No refresh in flight.
    Idle,
    /// A refresh call is outstanding; new 401s are queued.
    Refreshing,
    /// The refresh settled and queued callers are being resumed.
    Draining,
}

/// A caller parked until the current refresh settles.
struct PendingRequest {
    /// The request to re-issue; `None` for an explicit refresh.
    request: Option<ApiRequest>,
    resume: oneshot::Sender<Result<AccessToken>>,
}

struct CoordinatorState {
    phase: Phase,
    queue: VecDeque<PendingRequest>,
    cycles: u64,
}

struct CoordinatorInner {
    state: Mutex<CoordinatorState>,
    store: CredentialStore,
    refresher: Arc<dyn TokenRefresher>,
    logout: LogoutHandler,
}

/// How a caller takes part in a cycle.
enum Entry {
    /// The stored token already differs from the rejected one.
    Rotated(AccessToken),
    Lead(RefreshToken),
    Wait(oneshot::Receiver<Result<AccessToken>>),
    Unrecoverable(sesh_core::Error),
}

/// Coordinates token refresh across every clone of a client.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: CredentialStore,
        refresher: Arc<dyn TokenRefresher>,
        logout: LogoutHandler,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                state: Mutex::new(CoordinatorState {
                    phase: Phase::Idle,
                    queue: VecDeque::new(),
                    cycles: 0,
                }),
                store,
                refresher,
                logout,
            }),
        }
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// How many callers are waiting on the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// The waiting requests, in arrival order.
    pub fn pending_requests(&self) -> Vec<ApiRequest> {
        self.lock()
            .queue
            .iter()
            .filter_map(|entry| entry.request.clone())
            .collect()
    }

    /// Number of refresh cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.lock().cycles
    }

    /// Obtain a fresh access token for a request that was rejected with 401.
    ///
    /// `sent` is the access token the request carried. If the store already
    /// holds a different one, a refresh finished after the request went out
    /// and that token is returned without refreshing again. Otherwise this
    /// starts a refresh if none is running, or waits for the running one;
    /// the returned token belongs to the cycle this call joined.
    #[instrument(skip(self, request, sent), fields(method = %request.method(), path = request.path()))]
    pub async fn recover(
        &self,
        request: &ApiRequest,
        sent: Option<&AccessToken>,
    ) -> Result<AccessToken> {
        self.join(Some((request, sent))).await
    }

    /// Refresh now, sharing any refresh already in flight.
    #[instrument(skip(self))]
    pub async fn refresh_now(&self) -> Result<AccessToken> {
        self.join(None).await
    }

    /// The stored access token, if it is not the one that was rejected.
    fn rotated_since(&self, sent: Option<&AccessToken>) -> Option<AccessToken> {
        match self.inner.store.access_token() {
            Ok(Some(current)) if sent != Some(&current) => Some(current),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn join(
        &self,
        rejected: Option<(&ApiRequest, Option<&AccessToken>)>,
    ) -> Result<AccessToken> {
        let entry = {
            let mut state = self.lock();
            match state.phase {
                Phase::Refreshing => {
                    let (resume, wait) = oneshot::channel();
                    state.queue.push_back(PendingRequest {
                        request: rejected.map(|(request, _)| request.clone()),
                        resume,
                    });
                    debug!(queued = state.queue.len(), "Refresh in flight, queueing");
                    Entry::Wait(wait)
                }
                // Draining never outlives the critical section in `settle`,
                // so it cannot be observed here.
                Phase::Idle | Phase::Draining => match rejected
                    .and_then(|(_, sent)| self.rotated_since(sent))
                {
                    Some(current) => {
                        debug!("Token rotated since the request was sent");
                        Entry::Rotated(current)
                    }
                    None => match self.inner.store.refresh_token() {
                        Ok(Some(token)) => {
                            state.phase = Phase::Refreshing;
                            state.cycles += 1;
                            debug!(cycle = state.cycles, "Starting refresh");
                            Entry::Lead(token)
                        }
                        Ok(None) => Entry::Unrecoverable(AuthError::MissingRefreshToken.into()),
                        Err(e) => Entry::Unrecoverable(e),
                    },
                },
            }
        };

        match entry {
            Entry::Rotated(current) => Ok(current),
            Entry::Lead(token) => self.lead(token).await,
            Entry::Wait(wait) => wait
                .await
                .unwrap_or_else(|_| Err(AuthError::RefreshInterrupted.into())),
            Entry::Unrecoverable(err) => {
                warn!(error = %err, "Cannot refresh, ending session");
                self.inner.logout.invalidate();
                Err(err)
            }
        }
    }

    async fn lead(&self, refresh_token: RefreshToken) -> Result<AccessToken> {
        let guard = SettleGuard {
            coordinator: self,
            armed: true,
        };

        let outcome = self.run_refresh(&refresh_token).await;
        match &outcome {
            Ok(_) => info!("Session refreshed"),
            Err(e) => {
                warn!(error = %e, "Refresh failed, ending session");
                self.inner.logout.invalidate();
            }
        }

        guard.settle(outcome.clone());
        outcome
    }

    async fn run_refresh(&self, refresh_token: &RefreshToken) -> Result<AccessToken> {
        let refreshed = self.inner.refresher.refresh(refresh_token).await?;

        // A token we cannot read identity from is as good as no token.
        refreshed.access_token.claims()?;

        self.inner.store.save_refresh(
            &refreshed.access_token,
            &refreshed.refresh_token,
            refreshed.descriptor.as_ref(),
        )?;

        Ok(refreshed.access_token)
    }

    /// Resume every queued caller with `outcome`, oldest first, and go idle.
    fn settle(&self, outcome: Result<AccessToken>) {
        let mut state = self.lock();
        state.phase = Phase::Draining;

        let queue = std::mem::take(&mut state.queue);
        debug!(
            count = queue.len(),
            success = outcome.is_ok(),
            "Draining queued requests"
        );

        for entry in queue {
            if let Some(request) = &entry.request {
                trace!(method = %request.method(), path = request.path(), "Resuming request");
            }
            if entry.resume.send(outcome.clone()).is_err() {
                trace!("Queued caller went away before the refresh settled");
            }
        }

        state.phase = Phase::Idle;
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("phase", &state.phase)
            .field("queued", &state.queue.len())
            .field("cycles", &state.cycles)
            .finish()
    }
}

/// Settles the cycle if the leading future is dropped before it finishes,
/// so queued callers are never left waiting.
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl SettleGuard<'_> {
    fn settle(mut self, outcome: Result<AccessToken>) {
        self.armed = false;
        self.coordinator.settle(outcome);
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Refresh abandoned before it settled");
            self.coordinator
                .settle(Err(AuthError::RefreshInterrupted.into()));
        }
    }
}
