//! CLI configuration utilities

use anyhow::{Context, Result};
use kith_http::ClientConfig;
use std::path::{Path, PathBuf};

/// Default client configuration file name inside the data directory
pub const CONFIG_FILE: &str = "client.json";

/// Data directory, falling back to the platform data dir
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kith")
    })
}

/// Configuration file to read, if any
///
/// An explicit path must exist; the default one is used only when present.
pub fn config_path(explicit: Option<PathBuf>, data_dir: &Path) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default = data_dir.join(CONFIG_FILE);
        default.exists().then_some(default)
    })
}

/// Load client configuration from file and `KITH_*` environment variables
pub fn load_client_config(explicit: Option<PathBuf>, data_dir: &Path) -> Result<ClientConfig> {
    let path = config_path(explicit, data_dir);
    ClientConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from environment".to_string(),
    })
}

/// Generate a default configuration file
pub fn generate_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ClientConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(config_path(None, dir.path()), None);

        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        assert_eq!(
            config_path(None, dir.path()),
            Some(dir.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("staging.json");
        assert_eq!(
            config_path(Some(explicit.clone()), dir.path()),
            Some(explicit)
        );
    }

    #[test]
    fn test_generated_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.json");

        generate_default_config(&path).unwrap();
        let config = load_client_config(Some(path), dir.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_generated_default_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        generate_default_config(&dir.path().join(CONFIG_FILE)).unwrap();

        let config = load_client_config(None, dir.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
