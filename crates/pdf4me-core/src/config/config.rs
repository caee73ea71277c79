//! Configuration management for pdf4mectl
//!
//! Configuration is stored in TOML format with support for multiple named
//! profiles. Values may reference environment variables with `${VAR}` or
//! `${VAR:-default}`.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::polling::PollingConfig;
use crate::client::{AuthScheme, ClientConfig};

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.pdf4me.com/";

/// Environment variable that overrides a profile's API key
pub const API_KEY_ENV: &str = "PDF4ME_API_KEY";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// API key; may be a `keyring:` reference
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth_scheme: AuthScheme,
    /// Per-request HTTP timeout; unset means no client-side timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Poll `api/v2/JobStatus/{jobId}` when a 202 carries a job id but no Location
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub job_status_fallback: bool,
    #[serde(default)]
    pub polling: PollingConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Profile {
    /// Profile with production defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            auth_scheme: AuthScheme::default(),
            polling: PollingConfig::default(),
            request_timeout_secs: None,
            job_status_fallback: false,
        }
    }

    /// Resolve the API key, honoring `PDF4ME_API_KEY` and keyring references
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with_env(Some(API_KEY_ENV))
    }

    /// Resolve the API key, consulting only the given environment variable
    pub fn resolve_api_key_with_env(&self, env_var: Option<&str>) -> Result<String> {
        let key = CredentialStore::new().resolve(&self.api_key, env_var)?;

        if key.trim().is_empty() {
            return Err(ConfigError::CredentialError(
                "API key is empty".to_string(),
            ));
        }
        Ok(key)
    }

    /// Build a client configuration with the resolved API key
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self.resolve_api_key()?;
        self.client_config_with_key(api_key)
    }

    /// Build a client configuration around an already resolved API key
    pub fn client_config_with_key(&self, api_key: String) -> Result<ClientConfig> {
        let base_url = Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })?;

        let mut config = ClientConfig::new(base_url, api_key)
            .with_auth_scheme(self.auth_scheme)
            .with_poll_strategy(self.polling.strategy())
            .with_job_status_fallback(self.job_status_fallback);
        if let Some(secs) = self.request_timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

impl Config {
    /// Resolve the profile to use
    ///
    /// Explicit name, then the configured default, then the first profile
    /// alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            if !self.profiles.contains_key(profile_name) {
                return Err(ConfigError::ProfileNotFound {
                    name: profile_name.to_string(),
                });
            }
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Create one with 'pdf4mectl profile set <name>' or set PDF4ME_API_KEY."
                    .to_string(),
            })
    }

    /// Look up a resolved profile by name
    pub fn profile(&self, explicit_profile: Option<&str>) -> Result<(String, &Profile)> {
        let name = self.resolve_profile(explicit_profile)?;
        let profile = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
        Ok((name, profile))
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file is an empty config
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&Self::expand_env_vars(&content)).map_err(|e| ConfigError::ParseError {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/pdf4mectl/config.toml` is preferred when it (or
    /// its directory) exists, falling back to
    /// `~/Library/Application Support/com.pdf4me.pdf4mectl/config.toml`.
    ///
    /// On Linux: ~/.config/pdf4mectl/config.toml
    /// On Windows: %APPDATA%\pdf4me\pdf4mectl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("pdf4mectl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path
                        .parent()
                        .map(|p| p.exists())
                        .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "pdf4me", "pdf4mectl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as-is so that profiles which
    /// are not used do not break loading.
    ///
    /// ```toml
    /// api_key = "${PDF4ME_PROD_KEY}"
    /// base_url = "${PDF4ME_GATEWAY:-https://api.pdf4me.com/}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollStrategy;
    use serial_test::serial;

    fn profile(key: &str) -> Profile {
        Profile::new(key)
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile("work".to_string(), profile("test-key"));
        config.default_profile = Some("work".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_minimal_profile_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
[profiles.work]
api_key = "abc"
"#,
        )
        .unwrap();

        let work = &config.profiles["work"];
        assert_eq!(work.base_url, DEFAULT_BASE_URL);
        assert_eq!(work.auth_scheme, AuthScheme::Basic);
        assert_eq!(work.polling, PollingConfig::default());
        assert_eq!(work.request_timeout_secs, None);
        assert!(!work.job_status_fallback);
    }

    #[test]
    fn test_raw_auth_scheme_parses() {
        let config: Config = toml::from_str(
            r#"
[profiles.legacy]
api_key = "abc"
auth_scheme = "raw"
"#,
        )
        .unwrap();
        assert_eq!(config.profiles["legacy"].auth_scheme, AuthScheme::Raw);
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("PDF4ME_TEST_EXPAND_KEY", "expanded-key");
        }

        let content = r#"
[profiles.test]
api_key = "${PDF4ME_TEST_EXPAND_KEY}"
base_url = "${PDF4ME_TEST_EXPAND_URL:-https://gateway.example.com/}"
"#;

        let config: Config = toml::from_str(&Config::expand_env_vars(content)).unwrap();
        let test = &config.profiles["test"];
        assert_eq!(test.api_key, "expanded-key");
        assert_eq!(test.base_url, "https://gateway.example.com/");

        unsafe {
            std::env::remove_var("PDF4ME_TEST_EXPAND_KEY");
        }
    }

    #[test]
    #[serial]
    fn test_unset_env_var_is_left_unexpanded() {
        unsafe {
            std::env::remove_var("PDF4ME_TEST_NEVER_SET");
        }
        let expanded = Config::expand_env_vars(r#"api_key = "${PDF4ME_TEST_NEVER_SET}""#);
        assert_eq!(expanded, r#"api_key = "${PDF4ME_TEST_NEVER_SET}""#);
    }

    #[test]
    fn test_profile_resolution_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("z"));
        config.set_profile("alpha".to_string(), profile("a"));

        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");
    }

    #[test]
    fn test_explicit_missing_profile_is_not_found() {
        let mut config = Config::default();
        config.set_profile("work".to_string(), profile("k"));

        let err = config.resolve_profile(Some("missing")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { name } if name == "missing"));
    }

    #[test]
    fn test_no_profiles_error() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles { .. }));
        assert!(err.to_string().contains("pdf4mectl profile set"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("work".to_string(), profile("k"));
        config.default_profile = Some("work".to_string());

        assert!(config.remove_profile("work").is_some());
        assert_eq!(config.default_profile, None);
        assert!(config.remove_profile("work").is_none());
    }

    #[test]
    fn test_list_profiles_sorted() {
        let mut config = Config::default();
        for name in ["c", "a", "b"] {
            config.set_profile(name.to_string(), profile(name));
        }
        let names: Vec<_> = config.list_profiles().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_client_config_from_profile() {
        let mut work = profile("secret");
        work.base_url = "http://localhost:8080/".to_string();
        work.auth_scheme = AuthScheme::Raw;
        work.request_timeout_secs = Some(30);
        work.polling.interval_secs = 1;
        work.polling.max_attempts = 3;

        let config = work.client_config_with_key("secret".to_string()).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.auth_scheme, AuthScheme::Raw);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            config.poll,
            PollStrategy::fixed(Duration::from_secs(1), 3)
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let mut work = profile("secret");
        work.base_url = "not a url".to_string();
        let err = work.client_config_with_key("secret".to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    #[serial]
    fn test_empty_api_key_is_rejected() {
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }
        let err = profile("").resolve_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::CredentialError(_)));
    }

    #[test]
    #[serial]
    fn test_api_key_env_override() {
        unsafe {
            std::env::set_var(API_KEY_ENV, "from-env");
        }
        assert_eq!(profile("from-file").resolve_api_key().unwrap(), "from-env");
        assert_eq!(
            profile("from-file").resolve_api_key_with_env(None).unwrap(),
            "from-file"
        );
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }
    }
}
