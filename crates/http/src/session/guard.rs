//! Post-flight hook run on every response

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::attempt::RequestAttempt;
use super::refresh::RefreshCoordinator;
use super::routes::RouteClassifier;
use super::token::TokenStore;
use crate::client::error::ClientError;

/// What the client should do with a finished attempt
#[derive(Debug)]
pub enum Verdict {
    /// Hand this result to the caller
    Complete(Result<Value, ClientError>),
    /// The session was refreshed; send the same attempt again
    Replay,
}

/// Find an access token in a response body
///
/// Accepts `{ "accessToken": .. }` and `{ "data": { "accessToken": .. } }`.
pub fn extract_access_token(body: &Value) -> Option<&str> {
    body.get("accessToken")
        .and_then(Value::as_str)
        .or_else(|| body.get("data")?.get("accessToken")?.as_str())
        .filter(|token| !token.is_empty())
}

/// Harvests tokens from responses and drives the refresh-and-retry flow
pub struct ResponseGuard {
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    routes: RouteClassifier,
}

impl ResponseGuard {
    pub fn new(
        store: Arc<TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
        routes: RouteClassifier,
    ) -> Self {
        Self {
            store,
            coordinator,
            routes,
        }
    }

    /// Inspect the outcome of `attempt`
    ///
    /// Only a first 401 on a non-exempt URL is acted upon; every other
    /// failure is handed back untouched.
    pub async fn after_response(
        &self,
        attempt: &mut RequestAttempt,
        outcome: Result<Value, ClientError>,
    ) -> Verdict {
        let error = match outcome {
            Ok(body) => {
                if let Some(token) = extract_access_token(&body) {
                    debug!(path = attempt.path(), "Captured access token from response");
                    self.store.set_token(token);
                }
                return Verdict::Complete(Ok(body));
            }
            Err(error) if !error.is_auth_expired() => return Verdict::Complete(Err(error)),
            Err(error) => error,
        };

        if self.routes.is_auth_exempt(attempt.path()) {
            debug!(path = attempt.path(), "Credential failure on auth endpoint");
            return Verdict::Complete(Err(error));
        }
        if attempt.already_retried() {
            debug!(path = attempt.path(), "Request rejected again after refresh");
            return Verdict::Complete(Err(error));
        }

        attempt.mark_retried();
        match self.coordinator.ensure_fresh_token().await {
            Ok(_) => {
                info!(
                    method = %attempt.method(),
                    path = attempt.path(),
                    "Replaying request with refreshed token"
                );
                Verdict::Replay
            }
            // The failed cycle has already torn the session down.
            Err(refresh_error) => Verdict::Complete(Err(ClientError::Refresh(refresh_error))),
        }
    }
}
