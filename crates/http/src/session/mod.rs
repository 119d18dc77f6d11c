//! Client-side session: access token upkeep and refresh coordination
//!
//! Every outbound call flows through [`RequestGate`], the network, then
//! [`ResponseGuard`]. Both share one [`RefreshCoordinator`] and one
//! [`TokenStore`], all owned by a single [`Session`] that is built once and
//! injected into the client.

pub mod attempt;
pub mod expiry;
pub mod gate;
pub mod guard;
pub mod policy;
pub mod ports;
pub mod refresh;
pub mod routes;
pub mod teardown;
pub mod token;

use std::sync::Arc;

pub use attempt::RequestAttempt;
pub use expiry::DecodeError;
pub use gate::{GateAction, RequestGate};
pub use guard::{ResponseGuard, Verdict};
pub use policy::SessionPolicy;
pub use ports::{MemoryNavigator, MemoryStorage, Navigator, StorageClearer};
pub use refresh::{RefreshCoordinator, RefreshError, TokenRefresher};
pub use routes::RouteClassifier;
pub use teardown::{Teardown, TeardownOutcome};
pub use token::{Token, TokenStore};

/// All shared session state, wired together
pub struct Session {
    policy: SessionPolicy,
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    teardown: Arc<Teardown>,
    gate: RequestGate,
    guard: ResponseGuard,
}

impl Session {
    pub fn new(
        policy: SessionPolicy,
        refresher: Arc<dyn TokenRefresher>,
        storage: Arc<dyn StorageClearer>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let routes = RouteClassifier::new(&policy);
        let store = Arc::new(TokenStore::new());
        let teardown = Arc::new(Teardown::new(
            store.clone(),
            storage,
            navigator,
            routes.clone(),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            refresher,
            teardown.clone(),
        ));
        let gate = RequestGate::new(
            store.clone(),
            coordinator.clone(),
            routes.clone(),
            policy.refresh_lead_time(),
        );
        let guard = ResponseGuard::new(store.clone(), coordinator.clone(), routes);

        Self {
            policy,
            store,
            coordinator,
            teardown,
            gate,
            guard,
        }
    }

    pub const fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub const fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub const fn guard(&self) -> &ResponseGuard {
        &self.guard
    }

    /// Seed the session with a token obtained elsewhere
    pub fn set_access_token(&self, raw: impl Into<String>) -> Token {
        self.store.set_token(raw)
    }

    /// End the session locally without forcing navigation
    pub fn sign_out(&self) {
        self.teardown.clear_local_state();
    }
}
