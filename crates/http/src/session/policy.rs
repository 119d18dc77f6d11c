//! Fixed session policy values

use std::time::Duration;

use config::ConfigError;
use kith_core::validation::validators::{validate_absolute_path, validate_not_empty};
use serde::{Deserialize, Serialize};

/// Proactive refresh fires this many milliseconds before the decoded expiry.
pub const DEFAULT_REFRESH_LEAD_TIME_MS: u64 = 120_000;

/// Policy applied by the session coordinator
///
/// Built once per [`Session`](super::Session) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// How long before expiry a proactive refresh is attempted, in milliseconds
    pub refresh_lead_time_ms: u64,
    /// Substrings marking request URLs that never take part in refresh logic
    pub auth_exempt_paths: Vec<String>,
    /// UI route prefixes that are never force-redirected on teardown
    pub public_routes: Vec<String>,
    /// Sign-in screen, target of the teardown redirect
    pub sign_in_route: String,
    /// Sign-up screen
    pub sign_up_route: String,
    /// Path of the refresh endpoint
    pub refresh_path: String,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            refresh_lead_time_ms: DEFAULT_REFRESH_LEAD_TIME_MS,
            auth_exempt_paths: vec![
                "/auth/refresh".to_string(),
                "/auth/login".to_string(),
                "/auth/verify-otp".to_string(),
                "/auth/send-otp".to_string(),
            ],
            public_routes: vec![
                "/".to_string(),
                "/events".to_string(),
                "/events/".to_string(),
                "/events/:id".to_string(),
            ],
            sign_in_route: "/sign-in".to_string(),
            sign_up_route: "/sign-up".to_string(),
            refresh_path: "/auth/refresh".to_string(),
        }
    }
}

impl SessionPolicy {
    /// Lead time as a [`Duration`]
    pub const fn refresh_lead_time(&self) -> Duration {
        Duration::from_millis(self.refresh_lead_time_ms)
    }

    /// Check that every configured path is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in &self.auth_exempt_paths {
            validate_not_empty(path, "session.auth_exempt_paths")?;
        }
        for route in &self.public_routes {
            validate_absolute_path(route, "session.public_routes")?;
        }
        validate_absolute_path(&self.sign_in_route, "session.sign_in_route")?;
        validate_absolute_path(&self.sign_up_route, "session.sign_up_route")?;
        validate_absolute_path(&self.refresh_path, "session.refresh_path")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.refresh_lead_time(), Duration::from_secs(120));
        assert_eq!(policy.auth_exempt_paths.len(), 4);
        assert!(policy.auth_exempt_paths.contains(&"/auth/send-otp".to_string()));
        assert_eq!(policy.sign_in_route, "/sign-in");
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let policy: SessionPolicy =
            serde_json::from_str(r#"{"refresh_lead_time_ms": 30000}"#).unwrap();
        assert_eq!(policy.refresh_lead_time(), Duration::from_secs(30));
        assert_eq!(policy.refresh_path, "/auth/refresh");
    }

    #[test]
    fn test_validate_rejects_relative_route() {
        let policy = SessionPolicy {
            sign_in_route: "sign-in".to_string(),
            ..SessionPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
