//! Profile management command implementations

use std::io::{self, Write};

use anyhow::Context;
use colored::Colorize;
use pdf4me_core::config::{BackoffKind, CredentialStore};
use pdf4me_core::{AuthScheme, Profile};
use serde_json::json;
use tracing::{debug, info, trace};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{Pdf4meCtlError, Result as CliResult};
use crate::output;

/// Fields of `profile set`; `None` keeps the existing value
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub auth_scheme: Option<AuthScheme>,
    pub poll_interval: Option<u64>,
    pub max_attempts: Option<u32>,
    pub backoff: Option<BackoffKind>,
    pub request_timeout: Option<u64>,
    pub job_status_fallback: Option<bool>,
    pub use_keyring: bool,
    pub make_default: bool,
}

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format).await,
        Path => handle_path(conn_mgr, output_format).await,
        Show { name } => handle_show(conn_mgr, name, output_format).await,
        Set {
            name,
            api_key,
            base_url,
            auth_scheme,
            poll_interval,
            max_attempts,
            backoff,
            request_timeout,
            job_status_fallback,
            #[cfg(feature = "secure-storage")]
            use_keyring,
            default,
        } => {
            let update = ProfileUpdate {
                api_key: api_key.clone(),
                base_url: base_url.clone(),
                auth_scheme: *auth_scheme,
                poll_interval: *poll_interval,
                max_attempts: *max_attempts,
                backoff: *backoff,
                request_timeout: *request_timeout,
                job_status_fallback: *job_status_fallback,
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
                #[cfg(not(feature = "secure-storage"))]
                use_keyring: false,
                make_default: *default,
            };
            handle_set(conn_mgr, name, update).await
        }
        Remove { name, yes } => handle_remove(conn_mgr, name, *yes).await,
        Default { name } => handle_default(conn_mgr, name).await,
    }
}

async fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default_name = conn_mgr.config.default_profile.as_deref();

    match output::OutputFormat::structured(output_format) {
        Some(fmt) => {
            let config_path = conn_mgr
                .display_path()
                .map(|p| p.to_string_lossy().to_string());

            let profile_list: Vec<serde_json::Value> = profiles
                .iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "base_url": profile.base_url,
                        "auth_scheme": profile.auth_scheme.to_string(),
                        "is_default": default_name == Some(name.as_str()),
                    })
                })
                .collect();

            let output_data = if fmt == output::OutputFormat::Table {
                json!(profile_list)
            } else {
                json!({
                    "config_path": config_path,
                    "profiles": profile_list,
                    "count": profiles.len()
                })
            };
            output::print_output(&output_data, fmt)?;
        }
        None => {
            if let Some(path) = conn_mgr.display_path() {
                println!("Configuration file: {}", path.display());
                println!();
            }

            if profiles.is_empty() {
                info!("No profiles configured");
                println!("No profiles configured.");
                println!("Use 'pdf4mectl profile set' to create a profile.");
                return Ok(());
            }

            for (name, profile) in &profiles {
                if default_name == Some(name.as_str()) {
                    println!("  {} {}", name.bold().cyan(), "(default)".green());
                } else {
                    println!("  {}", name.bold().cyan());
                }
                println!("    {} {}", "URL:".dimmed(), profile.base_url);
            }
        }
    }

    Ok(())
}

async fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match conn_mgr.display_path() {
        Some(path) => path,
        None => pdf4me_core::Config::config_path()?,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let output_data = json!({
                "config_path": config_path.to_str()
            });
            let fmt = match output_format {
                OutputFormat::Yaml => output::OutputFormat::Yaml,
                _ => output::OutputFormat::Json,
            };
            output::print_output(&output_data, fmt)?;
        }
        _ => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

async fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| Pdf4meCtlError::ProfileNotFound { name: name.into() })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let storage = if CredentialStore::is_keyring_reference(&profile.api_key) {
        "keyring"
    } else {
        "plaintext"
    };

    match output::OutputFormat::structured(output_format) {
        Some(fmt) => {
            let mut output_data = json!({
                "name": name,
                "is_default": is_default,
                "base_url": profile.base_url,
                "auth_scheme": profile.auth_scheme.to_string(),
                "api_key_preview": key_preview(&profile.api_key),
                "api_key_storage": storage,
                "job_status_fallback": profile.job_status_fallback,
                "polling": profile.polling,
            });
            if let Some(secs) = profile.request_timeout_secs {
                output_data["request_timeout_secs"] = json!(secs);
            }
            output::print_output(&output_data, fmt)?;
        }
        None => {
            println!("Profile: {}", name);
            if is_default {
                println!("Default: yes");
            }
            println!("Base URL: {}", profile.base_url);
            println!("Auth scheme: {}", profile.auth_scheme);
            println!("API key: {} ({})", key_preview(&profile.api_key), storage);
            println!(
                "Polling: every {}s, up to {} attempts ({:?} backoff)",
                profile.polling.interval_secs, profile.polling.max_attempts, profile.polling.backoff
            );
            if let Some(secs) = profile.request_timeout_secs {
                println!("Request timeout: {}s", secs);
            }
            if profile.job_status_fallback {
                println!("JobStatus fallback: enabled");
            }
        }
    }
    Ok(())
}

/// Enough of the key to recognize it, never the whole secret
fn key_preview(api_key: &str) -> String {
    if CredentialStore::is_keyring_reference(api_key) {
        return api_key.to_string();
    }
    let prefix: String = api_key.chars().take(8).collect();
    format!("{}...", prefix)
}

async fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    update: ProfileUpdate,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);
    let existing = conn_mgr.config.profiles.get(name);

    let api_key = match (update.api_key, existing) {
        (Some(key), _) => Some(key),
        (None, Some(_)) => None,
        (None, None) => Some(
            rpassword::prompt_password("API key: ").context("Failed to read API key")?,
        ),
    };
    if let Some(key) = &api_key
        && key.trim().is_empty()
    {
        return Err(Pdf4meCtlError::InvalidInput {
            message: "API key must not be empty".to_string(),
        });
    }

    let mut profile = match existing {
        Some(profile) => profile.clone(),
        None => Profile::new(String::new()),
    };

    if let Some(key) = api_key {
        profile.api_key = if update.use_keyring {
            CredentialStore::new()
                .store_api_key(name, &key)
                .context("Failed to store API key in keyring")?
        } else {
            key
        };
    }
    if let Some(base_url) = update.base_url {
        url::Url::parse(&base_url).map_err(|e| Pdf4meCtlError::InvalidInput {
            message: format!("invalid base URL '{}': {}", base_url, e),
        })?;
        profile.base_url = base_url;
    }
    if let Some(scheme) = update.auth_scheme {
        profile.auth_scheme = scheme;
    }
    if let Some(secs) = update.poll_interval {
        profile.polling.interval_secs = secs;
    }
    if let Some(max_attempts) = update.max_attempts {
        profile.polling.max_attempts = max_attempts;
    }
    if let Some(backoff) = update.backoff {
        profile.polling.backoff = backoff;
    }
    if let Some(secs) = update.request_timeout {
        profile.request_timeout_secs = Some(secs);
    }
    if let Some(enabled) = update.job_status_fallback {
        profile.job_status_fallback = enabled;
    }

    let mut config = conn_mgr.config.clone();
    config.set_profile(name.to_string(), profile);
    if update.make_default {
        config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config(&config)?;

    match conn_mgr.display_path() {
        Some(path) => {
            println!("Profile '{}' saved successfully to:", name);
            println!("  {}", path.display());
        }
        None => println!("Profile '{}' saved successfully.", name),
    }

    if config.default_profile.is_none() && config.profiles.len() > 1 {
        println!();
        println!("Tip: Set the default profile with:");
        println!("  pdf4mectl profile default {}", name);
    }

    Ok(())
}

async fn handle_remove(conn_mgr: &ConnectionManager, name: &str, yes: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let Some(profile) = conn_mgr.config.profiles.get(name) else {
        return Err(Pdf4meCtlError::ProfileNotFound { name: name.into() });
    };

    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if is_default {
        println!("Warning: '{}' is the default profile.", name);
    }

    if !yes {
        print!("Are you sure you want to remove profile '{}'? (y/N): ", name);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Profile removal cancelled.");
            return Ok(());
        }
    }

    if CredentialStore::is_keyring_reference(&profile.api_key)
        && let Err(e) = CredentialStore::new().delete_api_key(name)
    {
        debug!("Could not delete keyring entry for '{}': {}", name, e);
    }

    let mut config = conn_mgr.config.clone();
    config.remove_profile(name);
    if is_default {
        println!("Default profile cleared.");
    }
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

async fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Setting default profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(Pdf4meCtlError::ProfileNotFound { name: name.into() });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf4me_core::Config;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> (ConnectionManager, PathBuf) {
        let path = dir.path().join("config.toml");
        let config = Config::load_from_path(&path).unwrap();
        (
            ConnectionManager::with_config_path(config, Some(path.clone())),
            path,
        )
    }

    #[test]
    fn test_key_preview() {
        assert_eq!(key_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(key_preview("abc"), "abc...");
        assert_eq!(key_preview("keyring:work-api-key"), "keyring:work-api-key");
    }

    #[tokio::test]
    async fn test_set_creates_and_updates_profile() {
        let dir = TempDir::new().unwrap();
        let (mgr, path) = manager(&dir);

        let update = ProfileUpdate {
            api_key: Some("secret-key".to_string()),
            max_attempts: Some(25),
            make_default: true,
            ..Default::default()
        };
        handle_set(&mgr, "work", update).await.unwrap();

        let config = Config::load_from_path(&path).unwrap();
        let profile = &config.profiles["work"];
        assert_eq!(profile.api_key, "secret-key");
        assert_eq!(profile.polling.max_attempts, 25);
        assert_eq!(config.default_profile.as_deref(), Some("work"));

        // Updating keeps the key and untouched settings
        let mgr = ConnectionManager::with_config_path(config, Some(path.clone()));
        let update = ProfileUpdate {
            auth_scheme: Some(AuthScheme::Raw),
            ..Default::default()
        };
        handle_set(&mgr, "work", update).await.unwrap();

        let config = Config::load_from_path(&path).unwrap();
        let profile = &config.profiles["work"];
        assert_eq!(profile.api_key, "secret-key");
        assert_eq!(profile.auth_scheme, AuthScheme::Raw);
        assert_eq!(profile.polling.max_attempts, 25);
    }

    #[tokio::test]
    async fn test_set_rejects_bad_base_url() {
        let dir = TempDir::new().unwrap();
        let (mgr, _) = manager(&dir);
        let update = ProfileUpdate {
            api_key: Some("k".to_string()),
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = handle_set(&mgr, "work", update).await.unwrap_err();
        assert!(matches!(err, Pdf4meCtlError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_remove_clears_default() {
        let dir = TempDir::new().unwrap();
        let (mgr, path) = manager(&dir);
        let mut config = mgr.config.clone();
        config.set_profile("work".to_string(), Profile::new("k"));
        config.default_profile = Some("work".to_string());
        config.save_to_path(&path).unwrap();

        let mgr = ConnectionManager::with_config_path(config, Some(path.clone()));
        handle_remove(&mgr, "work", true).await.unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert!(config.profiles.is_empty());
        assert!(config.default_profile.is_none());
    }

    #[tokio::test]
    async fn test_default_requires_existing_profile() {
        let dir = TempDir::new().unwrap();
        let (mgr, _) = manager(&dir);
        let err = handle_default(&mgr, "ghost").await.unwrap_err();
        assert!(matches!(err, Pdf4meCtlError::ProfileNotFound { .. }));
    }
}
