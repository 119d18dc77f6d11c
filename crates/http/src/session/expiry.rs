//! Best-effort expiry extraction from access tokens
//!
//! The decoder never verifies a signature. The expiry it returns is an
//! advisory hint used to schedule proactive refreshes and must not be used
//! for authorization decisions: the server stays authoritative on validity.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use thiserror::Error;

/// Reasons an expiry hint could not be read
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token does not have a `header.payload[.signature]` structure
    #[error("Token is not made of dot-separated segments")]
    Malformed,

    /// The payload segment is not base64url
    #[error("Payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not a JSON object
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload has no numeric `exp` claim
    #[error("Payload has no numeric exp claim")]
    MissingClaim,
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<serde_json::Value>,
}

/// Extract the `exp` claim of `token`, converted from seconds to milliseconds
/// since the Unix epoch.
pub fn decode_expiry_ms(token: &str) -> Result<i64, DecodeError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(header), Some(payload)) if !header.is_empty() && !payload.is_empty() => payload,
        _ => return Err(DecodeError::Malformed),
    };

    // Some issuers keep the padding even though base64url forbids it.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes)?;

    let seconds = claim
        .exp
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|exp| exp.is_finite())
        .ok_or(DecodeError::MissingClaim)?;

    #[allow(clippy::cast_possible_truncation)]
    Ok((seconds * 1000.0).round() as i64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned token carrying `payload`
    pub(crate) fn token_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decodes_exp_seconds_to_millis() {
        let token = token_with_payload(&serde_json::json!({"sub": "u1", "exp": 1_700_000_000}));
        assert_eq!(decode_expiry_ms(&token).unwrap(), 1_700_000_000_000);
    }

    #[test]
    fn test_fractional_exp() {
        let token = token_with_payload(&serde_json::json!({"exp": 1.5}));
        assert_eq!(decode_expiry_ms(&token).unwrap(), 1500);
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":10}"#);
        let token = format!("{header}.{body}.sig");
        assert_eq!(decode_expiry_ms(&token).unwrap(), 10_000);
    }

    #[test]
    fn test_opaque_token_is_malformed() {
        assert!(matches!(
            decode_expiry_ms("opaque-session-token"),
            Err(DecodeError::Malformed)
        ));
        assert!(matches!(decode_expiry_ms(""), Err(DecodeError::Malformed)));
    }

    #[test]
    fn test_bad_base64() {
        assert!(matches!(
            decode_expiry_ms("a.!!!.c"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_non_json_payload() {
        let body = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            decode_expiry_ms(&format!("h.{body}.s")),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_missing_or_non_numeric_claim() {
        let token = token_with_payload(&serde_json::json!({"sub": "u1"}));
        assert!(matches!(decode_expiry_ms(&token), Err(DecodeError::MissingClaim)));

        let token = token_with_payload(&serde_json::json!({"exp": "tomorrow"}));
        assert!(matches!(decode_expiry_ms(&token), Err(DecodeError::MissingClaim)));
    }
}
