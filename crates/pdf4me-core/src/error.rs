//! Unified error handling for pdf4me-core
//!
//! Every failure of an operation is terminal; only a 202 "still processing"
//! answer is retried, and that never surfaces as an error.
//!
//! # Example
//!
//! ```rust
//! use pdf4me_core::CoreError;
//!
//! let err = CoreError::RequestFailed {
//!     status: 503,
//!     body: b"server error".to_vec(),
//! };
//! assert!(err.is_server_error());
//! assert_eq!(err.status(), Some(503));
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for PDF4me operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// A 202 response arrived without a poll URL
    #[error("Server accepted the job but sent no Location header to poll")]
    MissingLocationHeader,

    /// Any non-200/202 answer, at submit or poll time
    #[error("Request failed with HTTP {status}: {}", body_preview(.body))]
    RequestFailed { status: u16, body: Vec<u8> },

    /// Attempts exhausted while the job was still pending
    #[error("Job still processing after {attempts} poll attempts")]
    PollTimeout { attempts: u32 },

    /// The caller's cancellation signal fired while polling
    #[error("Polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// Local file read/write failure
    #[error("IO error for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Expected artifact or fields absent from a success body
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure (DNS, TLS, connection reset, client timeout)
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint or Location could not be turned into a URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Request construction error (wrong number of inputs, bad option)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Upstream bodies can be whole PDFs; keep the message readable.
fn body_preview(body: &[u8]) -> String {
    const LIMIT: usize = 512;
    let text = String::from_utf8_lossy(&body[..body.len().min(LIMIT)]);
    if body.len() > LIMIT {
        format!("{}... ({} bytes)", text.trim_end(), body.len())
    } else {
        text.trim_end().to_string()
    }
}

impl CoreError {
    /// Build an [`CoreError::Io`] for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Upstream HTTP status, if the error carries one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::RequestFailed { status, .. } => Some(*status),
            CoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Upstream body, if the error carries one
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            CoreError::RequestFailed { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if the operation ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::PollTimeout { .. } => true,
            CoreError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Validation(_) => true,
            _ => self.status() == Some(400),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_carries_status_and_body() {
        let err = CoreError::RequestFailed {
            status: 503,
            body: b"server error".to_vec(),
        };

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.body(), Some(&b"server error"[..]));
        assert!(err.is_server_error());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("HTTP 503"));
        assert!(err.to_string().contains("server error"));
    }

    #[test]
    fn test_status_helpers() {
        let unauthorized = CoreError::RequestFailed {
            status: 401,
            body: Vec::new(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_server_error());

        let not_found = CoreError::RequestFailed {
            status: 404,
            body: Vec::new(),
        };
        assert!(not_found.is_not_found());

        let bad_request = CoreError::RequestFailed {
            status: 400,
            body: Vec::new(),
        };
        assert!(bad_request.is_bad_request());
    }

    #[test]
    fn test_poll_timeout() {
        let err = CoreError::PollTimeout { attempts: 10 };
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("10 poll attempts"));
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = CoreError::Validation("merge needs at least two documents".to_string());
        assert!(err.is_bad_request());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_large_body_is_truncated_in_display() {
        let err = CoreError::RequestFailed {
            status: 500,
            body: vec![b'x'; 4096],
        };
        let msg = err.to_string();
        assert!(msg.contains("4096 bytes"));
        assert!(msg.len() < 1024);
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = CoreError::io(
            "missing.pdf",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("missing.pdf"));
    }
}
