//! Kith HTTP client
//!
//! A reqwest-based client whose session layer keeps the access token fresh:
//! refreshes are single-flight, requests rejected with an expired token are
//! replayed once, and an unrecoverable refresh failure ends the session.

pub mod client;
pub mod session;

pub use client::config::ClientConfig;
pub use client::error::ClientError;
pub use client::{KithClient, KithClientBuilder};
pub use session::{Session, SessionPolicy};
