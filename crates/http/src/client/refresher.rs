//! Refresh endpoint call

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::session::{RefreshError, TokenRefresher};

/// Body returned by the refresh endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
    #[serde(default = "default_success")]
    success: bool,
}

const fn default_success() -> bool {
    true
}

/// Calls `POST {base_url}{refresh_path}` with an empty body
///
/// The refresh credential travels as a cookie, so this must share the
/// cookie-enabled [`Client`] used for login.
pub struct HttpRefresher {
    client: Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(client: Client, base_url: &str, refresh_path: &str) -> Self {
        Self {
            client,
            url: format!("{base_url}{refresh_path}"),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self) -> Result<String, RefreshError> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        if !body.success {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: "refresh reported success=false".to_string(),
            });
        }

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::MissingToken)
    }
}
