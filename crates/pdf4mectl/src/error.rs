//! Error types for pdf4mectl
//!
//! Maps library errors onto user-facing categories with suggestions.

use colored::Colorize;
use pdf4me_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Authentication failed: HTTP 401
///   The server rejected the API key.
///
///   tip: check the key stored in the profile:
///       pdf4mectl profile show default
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the pdf4mectl application
#[derive(Error, Debug)]
pub enum Pdf4meCtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'pdf4mectl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("API error: {message}")]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("{failed} of {total} files failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for pdf4mectl operations
pub type Result<T> = std::result::Result<T, Pdf4meCtlError>;

impl Pdf4meCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Pdf4meCtlError::ProfileNotFound { name } => vec![
                "List available profiles: pdf4mectl profile list".to_string(),
                format!("Create profile '{}': pdf4mectl profile set {}", name, name),
            ],
            Pdf4meCtlError::NoProfileConfigured => vec![
                "Create a profile: pdf4mectl profile set default --api-key <key>".to_string(),
                "Or export the key for this shell: export PDF4ME_API_KEY=<key>".to_string(),
            ],
            Pdf4meCtlError::MissingCredentials { .. } => vec![
                "Update the profile key: pdf4mectl profile set <name> --api-key <key>".to_string(),
                "Verify environment variables are set correctly".to_string(),
            ],
            Pdf4meCtlError::AuthenticationFailed { .. } => vec![
                "Check your API key: pdf4mectl profile show <profile>".to_string(),
                "Some gateways expect the raw key: pdf4mectl profile set <name> --auth-scheme raw"
                    .to_string(),
                "Ensure the base URL is correct".to_string(),
            ],
            Pdf4meCtlError::ApiError {
                status: Some(404), ..
            } => vec![
                "Verify the endpoint path: pdf4mectl operations".to_string(),
                "Check the base URL of the profile: pdf4mectl profile show <profile>".to_string(),
            ],
            Pdf4meCtlError::ApiError {
                status: Some(400), ..
            } => vec![
                "Check the operation options passed with --set or --options".to_string(),
                "Verify the input file type matches the operation".to_string(),
            ],
            Pdf4meCtlError::Timeout { .. } => vec![
                "Allow more status checks: --max-attempts <n>".to_string(),
                "Wait longer between checks: --poll-interval <secs>".to_string(),
                "Or submit with --no-wait and resume later with `pdf4mectl poll <location>`"
                    .to_string(),
            ],
            Pdf4meCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the base URL is correct: pdf4mectl profile show <profile>".to_string(),
            ],
            Pdf4meCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: pdf4mectl <command> --help".to_string(),
                "List operations and their inputs: pdf4mectl operations".to_string(),
            ],
            Pdf4meCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let Pdf4meCtlError::AuthenticationFailed { .. } = self {
            diag = diag.detail("The server rejected the API key.");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for Pdf4meCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RequestFailed { status, .. } if status == 401 || status == 403 => {
                Pdf4meCtlError::AuthenticationFailed {
                    status,
                    message: err.to_string(),
                }
            }
            CoreError::RequestFailed { status, .. } => Pdf4meCtlError::ApiError {
                status: Some(status),
                message: err.to_string(),
            },
            CoreError::PollTimeout { .. } => Pdf4meCtlError::Timeout {
                message: err.to_string(),
            },
            CoreError::Cancelled { .. } => Pdf4meCtlError::Cancelled {
                message: err.to_string(),
            },
            CoreError::Io { path, source } => Pdf4meCtlError::FileError {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            CoreError::MissingLocationHeader | CoreError::MalformedResponse(_) => {
                Pdf4meCtlError::ApiError {
                    status: None,
                    message: err.to_string(),
                }
            }
            CoreError::Http(e) => Pdf4meCtlError::ConnectionError {
                message: e.to_string(),
            },
            CoreError::InvalidUrl { .. } | CoreError::Validation(_) => {
                Pdf4meCtlError::InvalidInput {
                    message: err.to_string(),
                }
            }
            CoreError::Config(config_err) => Pdf4meCtlError::from(config_err),
        }
    }
}

impl From<ConfigError> for Pdf4meCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => Pdf4meCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => Pdf4meCtlError::NoProfileConfigured,
            ConfigError::CredentialError(message) => {
                Pdf4meCtlError::MissingCredentials { message }
            }
            ConfigError::InvalidUrl { .. } => Pdf4meCtlError::InvalidInput {
                message: err.to_string(),
            },
            _ => Pdf4meCtlError::Config(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Pdf4meCtlError {
    fn from(err: serde_json::Error) -> Self {
        Pdf4meCtlError::InvalidInput {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for Pdf4meCtlError {
    fn from(err: std::io::Error) -> Self {
        Pdf4meCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for Pdf4meCtlError {
    fn from(err: anyhow::Error) -> Self {
        Pdf4meCtlError::Config(format!("{:#}", err))
    }
}
