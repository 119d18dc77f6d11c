//! Client configuration loading

use std::path::Path;

use config::ConfigError;
use kith_core::validation::validators::{validate_not_empty, validate_range, validate_url};
use kith_core::{CoreError, CoreResult, ValidateConfig};
use serde::{Deserialize, Serialize};

use crate::session::SessionPolicy;

/// Environment variable prefix, e.g. `KITH_BASE_URL` or
/// `KITH_SESSION__REFRESH_LEAD_TIME_MS`
pub const ENV_PREFIX: &str = "KITH";

/// Everything needed to build a [`KithClient`](super::KithClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API origin, without trailing slash
    pub base_url: String,
    /// Transport timeout in seconds, applied to every call including refresh
    pub timeout_secs: u64,
    /// User agent sent with every call
    pub user_agent: String,
    /// Token refresh policy
    pub session: SessionPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
            user_agent: concat!("kith-client/", env!("CARGO_PKG_VERSION")).to_string(),
            session: SessionPolicy::default(),
        }
    }
}

impl ValidateConfig for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.base_url, "base_url")?;
        validate_range(self.timeout_secs, 1, 600, "timeout_secs")?;
        validate_not_empty(&self.user_agent, "user_agent")?;
        self.session.validate()
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file, then the
    /// environment, in increasing order of precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration does not validate
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_validates() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ClientConfig::load(None).unwrap();
        assert_eq!(config.session, SessionPolicy::default());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://api.kith.app"
timeout_secs = 10

[session]
refresh_lead_time_ms = 60000
sign_in_route = "/login"
"#
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "https://api.kith.app");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.session.refresh_lead_time_ms, 60_000);
        assert_eq!(config.session.sign_in_route, "/login");
        assert_eq!(config.session.refresh_path, "/auth/refresh");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"base_url = "not a url""#).unwrap();

        let err = ClientConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        let config = ClientConfig {
            base_url: "https://staging.kith.app".to_string(),
            ..ClientConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(Some(&path)).unwrap(), config);
    }
}
