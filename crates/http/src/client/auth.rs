//! Authentication API client methods
//!
//! Tokens returned by these endpoints are captured by the session's response
//! guard; callers do not need to store them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientError, KithClient};

/// Password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address or phone number
    pub identifier: String,
    pub password: String,
}

/// Ask the server to send a one-time code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub identifier: String,
}

/// Exchange a one-time code for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    pub code: String,
}

/// Response of the authentication endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl KithClient {
    /// Sign in with a password
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.post("/auth/login", request).await
    }

    /// Request a one-time code
    pub async fn send_otp(&self, request: &SendOtpRequest) -> Result<AuthResponse, ClientError> {
        self.post("/auth/send-otp", request).await
    }

    /// Sign in with a one-time code
    pub async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<AuthResponse, ClientError> {
        self.post("/auth/verify-otp", request).await
    }

    /// Fetch the current session; may also rotate the held token
    pub async fn current_session(&self) -> Result<Value, ClientError> {
        self.get("/auth/me").await
    }

    /// Drop the local session without contacting the server
    pub fn sign_out(&self) {
        self.session.sign_out();
    }
}
