//! Configuration validation support

use config::ConfigError;
use serde::{Deserialize, Serialize};

/// Trait for validating configuration values
pub trait ValidateConfig: Serialize + for<'de> Deserialize<'de> {
    /// Validate the configuration
    ///
    /// Returns Ok(()) if valid, or an error describing what's wrong
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Common validation helpers
pub mod validators {
    use config::ConfigError;

    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::Message(format!("{field}: cannot be empty")));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn validate_url(url: &str, field: &str) -> Result<(), ConfigError> {
        url::Url::parse(url)
            .map_err(|e| ConfigError::Message(format!("{field}: invalid URL - {e}")))?;
        Ok(())
    }

    /// Validate that a value is an absolute path such as `/auth/login`
    pub fn validate_absolute_path(value: &str, field: &str) -> Result<(), ConfigError> {
        if !value.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "{field}: '{value}' must start with '/'"
            )));
        }
        Ok(())
    }

    /// Validate that a value is within range
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<(), ConfigError> {
        if value < min || value > max {
            return Err(ConfigError::Message(format!(
                "{field}: must be between {min} and {max}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validators::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("kith", "name").is_ok());
        let err = validate_not_empty("   ", "name").unwrap_err();
        assert_eq!(err.to_string(), "name: cannot be empty");
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.kith.app", "base_url").is_ok());
        assert!(validate_url("not a url", "base_url").is_err());
    }

    #[test]
    fn test_validate_absolute_path() {
        assert!(validate_absolute_path("/auth/refresh", "refresh_path").is_ok());
        let err = validate_absolute_path("auth/refresh", "refresh_path").unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(30, 1, 300, "timeout_secs").is_ok());
        let err = validate_range(0, 1, 300, "timeout_secs").unwrap_err();
        assert_eq!(err.to_string(), "timeout_secs: must be between 1 and 300");
    }
}
