//! API key storage
//!
//! A profile's `api_key` field holds either the key itself or a
//! `keyring:<entry>` reference into the OS keyring. Keyring support is
//! compiled in with the `secure-storage` feature; without it a reference
//! cannot be followed and resolving it is a [`ConfigError::CredentialError`].

use std::env;

use tracing::debug;

use super::error::{ConfigError, Result};

const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "pdf4mectl";

/// Keyring entry that holds the API key of `profile`
pub fn keyring_entry(profile: &str) -> String {
    format!("{}-api-key", profile)
}

/// Where new API keys are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    #[cfg(feature = "secure-storage")]
    Keyring,
    Plaintext,
}

#[derive(Debug)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Keyring storage when it is compiled in and reachable, plaintext otherwise
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        if keyring_reachable() {
            return Self {
                storage: CredentialStorage::Keyring,
            };
        }
        Self::plaintext()
    }

    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    pub fn storage(&self) -> CredentialStorage {
        self.storage
    }

    /// Store the API key of `profile`, returning what goes into the config file
    pub fn store_api_key(&self, profile: &str, api_key: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let name = keyring_entry(profile);
                open_entry(&name)?.set_password(api_key).map_err(|e| {
                    ConfigError::KeyringError(format!("cannot store '{}': {}", name, e))
                })?;
                debug!("Stored API key of '{}' in the keyring", profile);
                Ok(format!("{}{}", KEYRING_PREFIX, name))
            }
            CredentialStorage::Plaintext => {
                debug!("Keeping API key of '{}' in the config file", profile);
                Ok(api_key.to_string())
            }
        }
    }

    /// Resolve a stored value to the key itself
    ///
    /// A non-empty `env_var` wins over the stored value.
    pub fn resolve(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(from_env) = env::var(var)
            && !from_env.is_empty()
        {
            debug!("Using API key from {}", var);
            return Ok(from_env);
        }

        let Some(name) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            open_entry(name)?.get_password().map_err(|e| {
                ConfigError::CredentialError(format!(
                    "cannot read API key '{}' from the keyring: {}",
                    name, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "API key '{}' is stored in the keyring, but this build has no keyring support",
                name
            )))
        }
    }

    /// Forget the keyring entry of `profile`; a missing entry is fine
    pub fn delete_api_key(&self, profile: &str) -> Result<()> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let name = keyring_entry(profile);
                match open_entry(&name)?.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(e) => Err(ConfigError::KeyringError(format!(
                        "cannot delete '{}': {}",
                        name, e
                    ))),
                }
            }
            CredentialStorage::Plaintext => Ok(()),
        }
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}

#[cfg(feature = "secure-storage")]
fn open_entry(name: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, name)
        .map_err(|e| ConfigError::KeyringError(format!("cannot open '{}': {}", name, e)))
}

#[cfg(feature = "secure-storage")]
fn keyring_reachable() -> bool {
    match open_entry("__reachability__") {
        Ok(entry) => {
            let _ = entry.get_password();
            true
        }
        Err(_) => false,
    }
}
