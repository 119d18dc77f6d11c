//! Single-flight access token refresh
//!
//! At most one refresh call is in flight at any time. Callers arriving while
//! a refresh runs are queued as waiters and settled with the outcome of that
//! same call, in arrival order, before the coordinator returns to idle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::teardown::Teardown;
use super::token::{Token, TokenStore};

/// Why a refresh did not produce a token
///
/// Cloned to every waiter of the failed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The refresh call did not complete
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// The server answered but refused to issue a token
    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The refresh response carried no access token
    #[error("Refresh response did not contain an access token")]
    MissingToken,

    /// The caller driving the refresh was dropped before it finished
    #[error("Refresh was abandoned before completing")]
    Abandoned,
}

/// The network call behind a refresh
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Ask the server for a new access token
    async fn refresh(&self) -> Result<String, RefreshError>;
}

type Outcome = Result<Token, RefreshError>;

/// Pending continuation of a caller queued behind the in-flight refresh
pub type Waiter = oneshot::Receiver<Outcome>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

impl RefreshState {
    /// Return to idle and hand back every queued waiter
    fn finish(&mut self) -> Vec<oneshot::Sender<Outcome>> {
        self.refreshing = false;
        std::mem::take(&mut self.waiters)
    }
}

/// Guarantees a single refresh call for any number of concurrent callers
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    teardown: Arc<Teardown>,
    refresh_calls: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        teardown: Arc<Teardown>,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState::default()),
            store,
            refresher,
            teardown,
            refresh_calls: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh call is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of refresh calls issued so far
    pub fn refresh_count(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Queue behind the in-flight refresh, if there is one
    ///
    /// Returns `None` when idle. Checking and queueing happen under one lock
    /// so a waiter can never attach to a cycle that has already drained.
    pub fn join_in_flight(&self) -> Option<Waiter> {
        let mut state = self.lock();
        if !state.refreshing {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        state.waiters.push(tx);
        Some(rx)
    }

    /// Obtain a freshly refreshed token
    ///
    /// The first caller of a cycle issues the refresh call; everyone arriving
    /// before it settles receives the same token or the same error.
    pub async fn ensure_fresh_token(&self) -> Result<Token, RefreshError> {
        // Idle -> Refreshing must not straddle an await point.
        let waiter = {
            let mut state = self.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(waiter) = waiter {
            debug!("Refresh already in flight; queued behind it");
            return wait(waiter).await;
        }

        let flight = Flight {
            coordinator: self,
            settled: false,
        };
        flight.run().await
    }

    fn settle_success(&self, raw: String) -> Token {
        let token = self.store.set_token(raw);
        let waiters = self.lock().finish();

        info!(waiters = waiters.len(), "Access token refreshed");
        for waiter in waiters {
            let _ = waiter.send(Ok(token.clone()));
        }
        token
    }

    fn settle_failure(&self, error: &RefreshError) {
        let waiters = self.lock().finish();

        warn!(%error, waiters = waiters.len(), "Access token refresh failed");
        self.teardown.run();
        for waiter in waiters {
            let _ = waiter.send(Err(error.clone()));
        }
    }
}

/// Await a queued waiter; a dropped sender means the leader was cancelled
pub async fn wait(waiter: Waiter) -> Result<Token, RefreshError> {
    waiter.await.unwrap_or(Err(RefreshError::Abandoned))
}

/// The leader's side of one refresh cycle
///
/// If the leader future is dropped mid-call the cycle is released on drop so
/// queued waiters are not left hanging.
struct Flight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Flight<'_> {
    async fn run(mut self) -> Result<Token, RefreshError> {
        let coordinator = self.coordinator;
        coordinator.refresh_calls.fetch_add(1, Ordering::Relaxed);
        debug!("Issuing refresh call");

        let result = coordinator.refresher.refresh().await;
        self.settled = true;

        match result {
            Ok(raw) => Ok(coordinator.settle_success(raw)),
            Err(error) => {
                coordinator.settle_failure(&error);
                Err(error)
            }
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let waiters = self.coordinator.lock().finish();
        warn!(
            waiters = waiters.len(),
            "Refresh abandoned before completing"
        );
        for waiter in waiters {
            let _ = waiter.send(Err(RefreshError::Abandoned));
        }
    }
}
