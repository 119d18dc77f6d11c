//! Pre-flight hook run before every outbound request

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::attempt::RequestAttempt;
use super::refresh::{self, RefreshCoordinator};
use super::routes::RouteClassifier;
use super::token::TokenStore;

/// What the gate did before letting a request through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Auth-exempt URL, refresh state not consulted
    Exempt,
    /// Nothing to do
    Proceed,
    /// Held until the in-flight refresh settled
    Held,
    /// Triggered a proactive refresh first
    Refreshed,
}

/// Decides whether a request must wait for, or trigger, a refresh
pub struct RequestGate {
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    routes: RouteClassifier,
    lead_time: Duration,
}

impl RequestGate {
    pub fn new(
        store: Arc<TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
        routes: RouteClassifier,
        lead_time: Duration,
    ) -> Self {
        Self {
            store,
            coordinator,
            routes,
            lead_time,
        }
    }

    /// Run before `attempt` is sent. Never fails and never touches the
    /// request; refresh errors here are left for the response path.
    pub async fn before_send(&self, attempt: &RequestAttempt) -> GateAction {
        if self.routes.is_auth_exempt(attempt.path()) {
            return GateAction::Exempt;
        }

        if let Some(waiter) = self.coordinator.join_in_flight() {
            debug!(path = attempt.path(), "Holding request until refresh settles");
            if let Err(error) = refresh::wait(waiter).await {
                debug!(%error, path = attempt.path(), "Releasing held request after failed refresh");
            }
            return GateAction::Held;
        }

        if self
            .store
            .expires_within(self.lead_time, Utc::now().timestamp_millis())
        {
            debug!(path = attempt.path(), "Access token near expiry; refreshing first");
            if let Err(error) = self.coordinator.ensure_fresh_token().await {
                warn!(%error, path = attempt.path(), "Proactive refresh failed; sending request anyway");
            }
            return GateAction::Refreshed;
        }

        GateAction::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::expiry::tests::token_with_payload;
    use crate::session::policy::SessionPolicy;
    use crate::session::refresh::tests::{GatedRefresher, fixture};
    use crate::session::refresh::RefreshError;
    use serde_json::json;

    fn gate(fx: &crate::session::refresh::tests::Fixture) -> RequestGate {
        RequestGate::new(
            fx.store.clone(),
            fx.coordinator.clone(),
            RouteClassifier::new(&SessionPolicy::default()),
            Duration::from_secs(120),
        )
    }

    fn token_expiring_in(ms: i64) -> String {
        let exp = (Utc::now().timestamp_millis() + ms) / 1000;
        token_with_payload(&json!({ "exp": exp }))
    }

    #[tokio::test]
    async fn test_near_expiry_triggers_one_proactive_refresh() {
        let refresher = GatedRefresher::new(Ok("fresh".to_string()));
        refresher.release();
        let fx = fixture(refresher.clone(), "/feed");
        fx.store.set_token(token_expiring_in(60_000));

        let action = gate(&fx).before_send(&RequestAttempt::get("/posts")).await;

        assert_eq!(action, GateAction::Refreshed);
        assert_eq!(refresher.calls(), 1);
        assert_eq!(fx.store.access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_fresh_token_proceeds() {
        let refresher = GatedRefresher::new(Ok("unused".to_string()));
        let fx = fixture(refresher.clone(), "/feed");
        fx.store.set_token(token_expiring_in(3_600_000));

        let action = gate(&fx).before_send(&RequestAttempt::get("/posts")).await;

        assert_eq!(action, GateAction::Proceed);
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_opaque_or_missing_token_never_refreshes() {
        let refresher = GatedRefresher::new(Ok("unused".to_string()));
        let fx = fixture(refresher.clone(), "/feed");
        let gate = gate(&fx);

        assert_eq!(
            gate.before_send(&RequestAttempt::get("/posts")).await,
            GateAction::Proceed
        );
        fx.store.set_token("opaque");
        assert_eq!(
            gate.before_send(&RequestAttempt::get("/posts")).await,
            GateAction::Proceed
        );
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_exempt_url_ignores_refresh_state() {
        let refresher = GatedRefresher::new(Ok("unused".to_string()));
        let fx = fixture(refresher.clone(), "/feed");
        fx.store.set_token(token_expiring_in(1_000));

        let action = gate(&fx)
            .before_send(&RequestAttempt::post("/auth/login"))
            .await;

        assert_eq!(action, GateAction::Exempt);
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_proactive_failure_is_swallowed() {
        let refresher = GatedRefresher::new(Err(RefreshError::Transport(
            "connection reset".to_string(),
        )));
        refresher.release();
        let fx = fixture(refresher.clone(), "/events");
        fx.store.set_token(token_expiring_in(30_000));

        let action = gate(&fx).before_send(&RequestAttempt::get("/posts")).await;

        assert_eq!(action, GateAction::Refreshed);
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_is_held_while_refresh_in_flight() {
        let refresher = GatedRefresher::new(Ok("fresh".to_string()));
        let fx = fixture(refresher.clone(), "/feed");

        let leader = tokio::spawn({
            let coordinator = fx.coordinator.clone();
            async move { coordinator.ensure_fresh_token().await }
        });
        refresher.started.notified().await;

        let gate = Arc::new(gate(&fx));
        let held = tokio::spawn({
            let gate = gate.clone();
            async move { gate.before_send(&RequestAttempt::post("/posts")).await }
        });
        while fx.coordinator.waiter_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!held.is_finished());

        refresher.release();
        leader.await.unwrap().unwrap();

        assert_eq!(held.await.unwrap(), GateAction::Held);
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn test_held_request_proceeds_after_failed_refresh() {
        let error = RefreshError::Rejected {
            status: 401,
            message: "refresh token revoked".to_string(),
        };
        let refresher = GatedRefresher::new(Err(error.clone()));
        let fx = fixture(refresher.clone(), "/feed");
        fx.store.set_token("opaque");

        let leader = tokio::spawn({
            let coordinator = fx.coordinator.clone();
            async move { coordinator.ensure_fresh_token().await }
        });
        refresher.started.notified().await;

        let gate = Arc::new(gate(&fx));
        let held = tokio::spawn({
            let gate = gate.clone();
            async move { gate.before_send(&RequestAttempt::post("/posts")).await }
        });
        while fx.coordinator.waiter_count() == 0 {
            tokio::task::yield_now().await;
        }

        refresher.release();
        assert_eq!(leader.await.unwrap().unwrap_err(), error);

        assert_eq!(held.await.unwrap(), GateAction::Held);
        assert_eq!(refresher.calls(), 1);
        assert!(fx.store.token().is_none());
    }

    #[tokio::test]
    async fn test_proactive_failure_on_private_page_ends_session() {
        let refresher = GatedRefresher::new(Err(RefreshError::Transport(
            "connection reset".to_string(),
        )));
        refresher.release();
        let fx = fixture(refresher.clone(), "/family-tree");
        fx.storage.set_local("profile", "{}");
        fx.store.set_token(token_expiring_in(30_000));

        let action = gate(&fx).before_send(&RequestAttempt::get("/posts")).await;

        assert_eq!(action, GateAction::Refreshed);
        assert!(fx.store.token().is_none());
        assert!(fx.storage.is_empty());
        assert_eq!(fx.navigator.history(), vec!["/family-tree", "/sign-in"]);
    }
}
