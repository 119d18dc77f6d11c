//! Terminal session teardown

use std::sync::Arc;

use tracing::warn;

use super::ports::{Navigator, StorageClearer};
use super::routes::RouteClassifier;
use super::token::TokenStore;

/// What a teardown did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownOutcome {
    /// Location the user was on when the session ended
    pub location: String,
    /// Whether the user was sent to the sign-in screen
    pub redirected: bool,
}

/// Ends the local session after an unrecoverable refresh failure
pub struct Teardown {
    store: Arc<TokenStore>,
    storage: Arc<dyn StorageClearer>,
    navigator: Arc<dyn Navigator>,
    routes: RouteClassifier,
}

impl Teardown {
    pub fn new(
        store: Arc<TokenStore>,
        storage: Arc<dyn StorageClearer>,
        navigator: Arc<dyn Navigator>,
        routes: RouteClassifier,
    ) -> Self {
        Self {
            store,
            storage,
            navigator,
            routes,
        }
    }

    /// Drop every piece of client-side session state
    pub fn clear_local_state(&self) {
        self.storage.clear_local();
        self.storage.clear_session();
        self.store.clear();
    }

    /// Clear state, then redirect to sign-in unless the current location is
    /// public or already an auth screen. Runs once; never retries.
    pub fn run(&self) -> TeardownOutcome {
        self.clear_local_state();

        let location = self.navigator.current_path();
        let redirected = self.routes.needs_sign_in_redirect(&location);
        if redirected {
            self.navigator.navigate(self.routes.sign_in_route());
        }

        warn!(%location, redirected, "Session ended after refresh failure");
        TeardownOutcome {
            location,
            redirected,
        }
    }
}
