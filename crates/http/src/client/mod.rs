//! Kith HTTP client

pub mod auth;
pub mod config;
pub mod error;
pub mod refresher;

use std::sync::Arc;
use std::time::Duration;

use error::ClientError;
use reqwest::{Client, ClientBuilder, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use self::config::ClientConfig;
use self::refresher::HttpRefresher;
use crate::session::{
    MemoryNavigator, MemoryStorage, Navigator, RequestAttempt, Session, SessionPolicy,
    StorageClearer, Verdict,
};

/// Kith API client
///
/// Every call passes the session's request gate before it is sent and its
/// response guard afterwards, so callers never handle token expiry
/// themselves.
#[derive(Clone)]
pub struct KithClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl KithClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> KithClientBuilder {
        KithClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session shared by every clone of this client
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run `attempt` through the gate, the network and the guard
    ///
    /// A request rejected with 401 is replayed at most once, after a
    /// successful refresh.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        mut attempt: RequestAttempt,
    ) -> Result<T, ClientError> {
        loop {
            self.session.gate().before_send(&attempt).await;
            let outcome = self.dispatch(&attempt).await;

            match self.session.guard().after_response(&mut attempt, outcome).await {
                Verdict::Complete(result) => return Ok(serde_json::from_value(result?)?),
                Verdict::Replay => debug!(path = attempt.path(), "Replaying request"),
            }
        }
    }

    async fn dispatch(&self, attempt: &RequestAttempt) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, attempt.path());
        let mut request = self.client.request(attempt.method().clone(), url);

        if let Some(token) = self.session.tokens().access_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = attempt.body() {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(serde_json::from_slice(&bytes)?)
            }
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let mut attempt = RequestAttempt::new(method, path);
        if let Some(body) = body {
            attempt = attempt.with_body(serde_json::to_value(body)?);
        }
        self.execute(attempt).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send::<T, Value>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send::<T, Value>(Method::DELETE, path, None).await
    }
}

/// Builder for KithClient
#[derive(Default)]
pub struct KithClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    policy: Option<SessionPolicy>,
    storage: Option<Arc<dyn StorageClearer>>,
    navigator: Option<Arc<dyn Navigator>>,
    access_token: Option<String>,
}

impl KithClientBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .policy(config.session.clone())
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session policy
    pub fn policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Storage cleared on terminal session failure
    pub fn storage(mut self, storage: Arc<dyn StorageClearer>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Navigator consulted on terminal session failure
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Start with an access token already held
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<KithClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        // The refresh credential is a cookie set by the auth endpoints.
        let mut client_builder = ClientBuilder::new().cookie_store(true);

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("kith-client/", env!("CARGO_PKG_VERSION")).to_string()),
        );

        let client = client_builder.build()?;

        let policy = self.policy.unwrap_or_default();
        let refresher = Arc::new(HttpRefresher::new(
            client.clone(),
            &base_url,
            &policy.refresh_path,
        ));
        let storage: Arc<dyn StorageClearer> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(MemoryNavigator::default()),
        };

        let session = Arc::new(Session::new(policy, refresher, storage, navigator));
        if let Some(token) = self.access_token {
            session.set_access_token(token);
        }

        Ok(KithClient {
            client,
            base_url,
            session,
        })
    }
}
