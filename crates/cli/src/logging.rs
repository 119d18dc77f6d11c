use anyhow::Result;
use kith_core::tracing::{InstrumentationConfig, init_tracing};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "cli.log";

/// Default filter directives for every Kith crate at `level`
fn default_directives(level: Level) -> String {
    let level_str = level.as_str().to_lowercase();
    format!("kith={level_str},kith_http={level_str},kith_core={level_str}")
}

/// Initialize logging for the CLI
///
/// `RUST_LOG` overrides `log_level` in both modes.
pub fn init_logging(log_level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    if no_file_log {
        let config = InstrumentationConfig {
            log_level: default_directives(log_level),
            ..InstrumentationConfig::from_env()
        };
        init_tracing(&config)
    } else {
        init_file_logging(log_level, data_dir)
    }
}

fn init_file_logging(level: Level, data_dir: &Path) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(data_dir.join(LOG_FILE))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "kith=debug,kith_http=debug,kith_core=debug"
        );
    }
}
