//! Shared tracing setup for Kith binaries and tests

pub mod config;
pub mod init;

pub use config::InstrumentationConfig;
pub use init::init_tracing;
