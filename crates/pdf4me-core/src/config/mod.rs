//! Configuration and profile management for pdf4mectl
//!
//! Profiles hold everything needed to talk to a PDF4me deployment: the API
//! key, the base URL, the auth header scheme and the poll cadence.
//!
//! # Features
//!
//! - Multiple named profiles (e.g. production and a self-hosted gateway)
//! - Secure API key storage using the OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#[allow(clippy::module_inception)]
pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

pub use config::{API_KEY_ENV, Config, DEFAULT_BASE_URL, Profile};
pub use credential::{CredentialStorage, CredentialStore, keyring_entry};
pub use error::{ConfigError, Result};
pub use polling::{BackoffKind, PollingConfig};
