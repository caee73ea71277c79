//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    LoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write config file {}: {source}", .path.display())]
    SaveError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid profile file
    #[error("Invalid config file {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot serialize profiles: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profiles configured. {suggestion}")]
    NoProfiles { suggestion: String },

    /// The API key is empty or its keyring reference cannot be followed
    #[error("{0}")]
    CredentialError(String),

    #[cfg(feature = "secure-storage")]
    #[error("OS keyring: {0}")]
    KeyringError(String),

    #[error("Invalid base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Cannot determine the platform config directory")]
    ConfigDirError,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
