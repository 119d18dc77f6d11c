//! Access token storage

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tracing::debug;

use super::expiry::decode_expiry_ms;

/// An access token and its advisory expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    raw: String,
    expires_at_ms: Option<i64>,
}

impl Token {
    /// Wrap `raw`, reading its expiry hint when the payload allows it
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let expires_at_ms = match decode_expiry_ms(&raw) {
            Ok(ms) => Some(ms),
            Err(error) => {
                debug!(%error, "No expiry hint in access token; proactive refresh disabled");
                None
            }
        };
        Self { raw, expires_at_ms }
    }

    /// The opaque token string sent as bearer credential
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Decoded expiry instant in milliseconds since the Unix epoch
    pub const fn expires_at_ms(&self) -> Option<i64> {
        self.expires_at_ms
    }

    /// True when the expiry is known, still ahead of `now_ms` and no more
    /// than `lead` away from it.
    pub fn expires_within(&self, lead: Duration, now_ms: i64) -> bool {
        let Some(expires_at) = self.expires_at_ms else {
            return false;
        };
        let lead_ms = i64::try_from(lead.as_millis()).unwrap_or(i64::MAX);
        let remaining = expires_at.saturating_sub(now_ms);
        remaining > 0 && remaining <= lead_ms
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"<redacted>")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// Holder of the current access token
///
/// The token is swapped as a whole; readers never observe a token paired
/// with another token's expiry.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: ArcSwapOption<Token>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` as the current token and return what was stored
    pub fn set_token(&self, raw: impl Into<String>) -> Token {
        let token = Token::new(raw);
        self.current.store(Some(Arc::new(token.clone())));
        token
    }

    /// Current token, if any
    pub fn token(&self) -> Option<Token> {
        self.current.load_full().map(|token| (*token).clone())
    }

    /// Current raw access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.current
            .load()
            .as_deref()
            .map(|token| token.as_str().to_owned())
    }

    /// Expiry hint of the current token
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.current
            .load()
            .as_deref()
            .and_then(|token| token.expires_at_ms())
    }

    /// See [`Token::expires_within`]; false when no token is held
    pub fn expires_within(&self, lead: Duration, now_ms: i64) -> bool {
        self.current
            .load()
            .as_deref()
            .is_some_and(|token| token.expires_within(lead, now_ms))
    }

    pub fn clear(&self) {
        self.current.store(None);
    }
}
