//! Connection management for PDF4me clients

use std::path::PathBuf;

use anyhow::Context;
use pdf4me_core::config::API_KEY_ENV;
use pdf4me_core::{ClientConfig, Config, Pdf4meClient, Profile};
use tracing::{debug, info, trace};

use crate::cli::ConnectionArgs;
use crate::error::{Pdf4meCtlError, Result as CliResult};

/// Environment variable that overrides a profile's base URL
pub const BASE_URL_ENV: &str = "PDF4ME_BASE_URL";

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with the given configuration
    #[allow(dead_code)]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save a modified configuration to the location it was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Path of the active configuration file, for display
    pub fn display_path(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| Config::config_path().ok())
    }

    /// Build the client configuration for a command
    ///
    /// Command-line flags win over `PDF4ME_API_KEY`/`PDF4ME_BASE_URL`, which
    /// win over the profile. When --config-file is specified explicitly,
    /// environment variables are ignored so the file is the only source.
    pub fn client_config(
        &self,
        profile_name: Option<&str>,
        overrides: &ConnectionArgs,
    ) -> CliResult<ClientConfig> {
        debug!("Creating PDF4me client configuration");
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env_api_key = if use_env_vars {
            read_env(API_KEY_ENV)
        } else {
            None
        };
        let env_base_url = if use_env_vars {
            read_env(BASE_URL_ENV)
        } else {
            None
        };
        if env_api_key.is_some() {
            debug!("Found {} environment variable", API_KEY_ENV);
        }
        if env_base_url.is_some() {
            debug!("Found {} environment variable", BASE_URL_ENV);
        }

        let explicit_key = overrides.api_key.clone().or(env_api_key);

        // A key from the flag or environment is enough on its own when no
        // profile is configured (or the named one is missing from the file).
        let mut profile = match self.config.profile(profile_name) {
            Ok((name, profile)) => {
                info!("Using PDF4me profile: {}", name);
                profile.clone()
            }
            Err(e) => match (&explicit_key, profile_name) {
                (Some(key), None) => {
                    info!("No profile configured, using API key from flag or environment");
                    Profile::new(key.clone())
                }
                _ => return Err(e.into()),
            },
        };

        if let Some(url) = overrides.base_url.clone().or(env_base_url) {
            debug!("Overriding base URL: {}", url);
            profile.base_url = url;
        }
        if let Some(secs) = overrides.request_timeout {
            profile.request_timeout_secs = Some(secs);
        }

        let api_key = match explicit_key {
            Some(key) if !key.trim().is_empty() => key,
            Some(_) => {
                return Err(Pdf4meCtlError::MissingCredentials {
                    message: "API key is empty".to_string(),
                });
            }
            None => profile.resolve_api_key_with_env(None)?,
        };

        let mut config = profile
            .client_config_with_key(api_key)?
            .with_user_agent(concat!("pdf4mectl/", env!("CARGO_PKG_VERSION")));

        let mut strategy = config.poll;
        if let Some(interval) = overrides.poll_interval {
            strategy = strategy.with_interval(interval);
        }
        if let Some(max_attempts) = overrides.max_attempts {
            strategy = strategy.with_max_attempts(max_attempts);
        }
        config = config.with_poll_strategy(strategy);

        debug!(
            "Client targets {} ({} attempts, {:?} interval)",
            config.base_url, config.poll.max_attempts, config.poll.interval
        );
        Ok(config)
    }

    /// Create a client for a command
    pub fn create_client(
        &self,
        profile_name: Option<&str>,
        overrides: &ConnectionArgs,
    ) -> CliResult<Pdf4meClient> {
        let config = self.client_config(profile_name, overrides)?;
        Ok(Pdf4meClient::new(config)?)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
