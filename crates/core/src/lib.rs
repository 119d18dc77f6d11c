//! Kith core types and utilities

pub mod error;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod validation;

pub use error::{CoreError, CoreResult};
pub use validation::ValidateConfig;
