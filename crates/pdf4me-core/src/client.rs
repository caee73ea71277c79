//! Async operation client for the PDF4me API
//!
//! One logical operation is a POST followed, when the server answers 202,
//! by a bounded series of GETs against the returned `Location` URL:
//!
//! ```text
//! POST endpoint ──200──▶ artifact
//!       │
//!       ├──202 + Location──▶ [sleep, GET location] × max_attempts
//!       │                        ├─200─▶ artifact
//!       │                        ├─202─▶ keep polling
//!       │                        └─other─▶ RequestFailed
//!       └──other──▶ RequestFailed
//! ```
//!
//! Only "still processing" is retried. Every other answer is terminal.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::artifact::Artifact;
use crate::error::{CoreError, Result};
use crate::poll::{PollOptions, PollSession, PollStrategy, ProgressEvent};
use crate::request::OperationRequest;
use crate::response::{OperationResponse, Outcome};

/// Default user agent; applications override it with `ClientConfig::with_user_agent`
pub const PDF4ME_USER_AGENT: &str = concat!("pdf4me-core/", env!("CARGO_PKG_VERSION"));

/// How the API key is placed in the `Authorization` header
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Basic <key>`
    #[default]
    Basic,
    /// `Authorization: <key>`
    Raw,
}

impl AuthScheme {
    pub fn header_value(&self, credential: &str) -> String {
        match self {
            AuthScheme::Basic => format!("Basic {}", credential),
            AuthScheme::Raw => credential.to_string(),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::Basic => write!(f, "basic"),
            AuthScheme::Raw => write!(f, "raw"),
        }
    }
}

/// Everything the client needs to reach one deployment
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub credential: String,
    pub auth_scheme: AuthScheme,
    pub poll: PollStrategy,
    /// Per-request timeout; applies to the POST and to each GET separately
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    /// Poll `api/v2/JobStatus/{jobId}` when a 202 has a `jobId` body but no Location
    pub job_status_fallback: bool,
}

impl ClientConfig {
    pub fn new(base_url: Url, credential: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            credential: credential.into(),
            auth_scheme: AuthScheme::default(),
            poll: PollStrategy::default(),
            request_timeout: None,
            user_agent: PDF4ME_USER_AGENT.to_string(),
            job_status_fallback: false,
        }
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn with_poll_strategy(mut self, poll: PollStrategy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_job_status_fallback(mut self, enabled: bool) -> Self {
        self.job_status_fallback = enabled;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("credential", &"<redacted>")
            .field("auth_scheme", &self.auth_scheme)
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("job_status_fallback", &self.job_status_fallback)
            .finish()
    }
}

/// `Url::join` drops the last path segment unless it ends with `/`
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Result of the initial POST
#[derive(Debug)]
pub enum Submission {
    /// 200: the artifact came back immediately
    Completed(OperationResponse),
    /// 202: poll this session to completion
    Accepted(PollSession),
}

/// Client for PDF4me request/poll operations
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Pdf4meClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for Pdf4meClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdf4meClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pdf4meClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        debug!(
            "Created PDF4me client for {} ({} auth)",
            config.base_url, config.auth_scheme
        );

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve an endpoint path (or absolute URL) against the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(endpoint) {
            return Ok(url);
        }
        self.config
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| CoreError::InvalidUrl {
                url: endpoint.to_string(),
                source,
            })
    }

    /// Submit and poll to completion
    pub async fn execute<B>(&self, endpoint: &str, body: &B) -> Result<Artifact>
    where
        B: Serialize + ?Sized,
    {
        self.execute_with(endpoint, body, PollOptions::default())
            .await
    }

    /// Submit and poll to completion, reporting progress and honoring cancellation
    pub async fn execute_with<B>(
        &self,
        endpoint: &str,
        body: &B,
        mut options: PollOptions,
    ) -> Result<Artifact>
    where
        B: Serialize + ?Sized,
    {
        let started = Instant::now();
        options.emit(ProgressEvent::Submitted {
            endpoint: endpoint.to_string(),
        });

        let result = match options.guard(self.submit(endpoint, body), 0).await {
            Ok(Submission::Completed(response)) => {
                options.emit(ProgressEvent::Completed {
                    attempts: 0,
                    elapsed: started.elapsed(),
                });
                Ok(Artifact::new(response.body, response.content_type))
            }
            Ok(Submission::Accepted(session)) => {
                options.emit(ProgressEvent::Accepted {
                    location: session.location().to_string(),
                });
                self.poll_loop(session, &mut options, started).await
            }
            Err(e) => Err(e),
        };

        report_failure(&options, result)
    }

    /// Execute a built catalog request
    pub async fn run(&self, request: &OperationRequest) -> Result<Artifact> {
        self.execute(request.endpoint(), request.body()).await
    }

    /// Execute a built catalog request with progress and cancellation
    pub async fn run_with(
        &self,
        request: &OperationRequest,
        options: PollOptions,
    ) -> Result<Artifact> {
        self.execute_with(request.endpoint(), request.body(), options)
            .await
    }

    /// Send the POST only
    pub async fn submit<B>(&self, endpoint: &str, body: &B) -> Result<Submission>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;
        info!("POST {}", url);

        let response = self
            .http
            .post(url.clone())
            .header(AUTHORIZATION, self.auth_header())
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        let response = OperationResponse::read(response).await?;

        debug!(
            "Submit answered HTTP {} ({} bytes)",
            response.status,
            response.body.len()
        );

        match response.outcome() {
            Outcome::Success => Ok(Submission::Completed(response)),
            Outcome::Pending => {
                let location = self.poll_location(&url, &response)?;
                info!("Job accepted, polling {}", location);
                Ok(Submission::Accepted(PollSession::new(
                    location,
                    self.config.poll,
                )))
            }
            Outcome::Failed => Err(CoreError::RequestFailed {
                status: response.status,
                body: response.body,
            }),
        }
    }

    /// Resume polling a session obtained from [`Pdf4meClient::submit`] or
    /// built from a saved Location URL
    pub async fn poll(&self, session: PollSession, mut options: PollOptions) -> Result<Artifact> {
        let result = self.poll_loop(session, &mut options, Instant::now()).await;
        report_failure(&options, result)
    }

    /// Start a poll session for a Location URL with this client's strategy
    pub fn session_for(&self, location: &str) -> Result<PollSession> {
        let url = self.endpoint_url(location)?;
        Ok(PollSession::new(url, self.config.poll))
    }

    async fn poll_loop(
        &self,
        mut session: PollSession,
        options: &mut PollOptions,
        started: Instant,
    ) -> Result<Artifact> {
        while let Some((attempt, delay)) = session.next_attempt() {
            trace!("Waiting {:?} before attempt {}", delay, attempt);
            if options.wait(delay).await {
                warn!("Polling cancelled before attempt {}", attempt);
                return Err(CoreError::Cancelled {
                    attempts: attempt - 1,
                });
            }

            options.emit(ProgressEvent::Polling {
                attempt,
                max_attempts: session.max_attempts(),
                elapsed: started.elapsed(),
            });

            let response = options
                .guard(self.get(session.location()), attempt - 1)
                .await?;
            debug!(
                "Poll {}/{} answered HTTP {}",
                attempt,
                session.max_attempts(),
                response.status
            );

            match response.outcome() {
                Outcome::Success => {
                    info!("Job completed after {} poll(s)", attempt);
                    options.emit(ProgressEvent::Completed {
                        attempts: attempt,
                        elapsed: started.elapsed(),
                    });
                    return Ok(Artifact::new(response.body, response.content_type));
                }
                Outcome::Pending => continue,
                Outcome::Failed => {
                    return Err(CoreError::RequestFailed {
                        status: response.status,
                        body: response.body,
                    });
                }
            }
        }

        warn!(
            "Job still processing after {} attempts",
            session.attempts()
        );
        Err(CoreError::PollTimeout {
            attempts: session.attempts(),
        })
    }

    async fn get(&self, url: &Url) -> Result<OperationResponse> {
        trace!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        Ok(OperationResponse::read(response).await?)
    }

    fn auth_header(&self) -> String {
        self.config.auth_scheme.header_value(&self.config.credential)
    }

    /// Poll URL for a 202; relative Locations resolve against the POST URL
    fn poll_location(&self, request_url: &Url, response: &OperationResponse) -> Result<Url> {
        if let Some(location) = &response.location {
            return request_url
                .join(location)
                .map_err(|source| CoreError::InvalidUrl {
                    url: location.clone(),
                    source,
                });
        }

        if self.config.job_status_fallback
            && let Some(job_id) = job_id(&response.body)
        {
            debug!("No Location header, falling back to JobStatus for job {}", job_id);
            let path = format!("api/v2/JobStatus/{}", job_id);
            return self
                .config
                .base_url
                .join(&path)
                .map_err(|source| CoreError::InvalidUrl { url: path, source });
        }

        Err(CoreError::MissingLocationHeader)
    }
}

fn report_failure(options: &PollOptions, result: Result<Artifact>) -> Result<Artifact> {
    if let Err(e) = &result {
        options.emit(ProgressEvent::Failed {
            error: e.to_string(),
        });
    }
    result
}

#[derive(Deserialize)]
struct AcceptedBody {
    #[serde(rename = "jobId", alias = "JobId", alias = "jobID")]
    job_id: Option<serde_json::Value>,
}

/// `jobId` from a 202 body, as a string or number
fn job_id(body: &[u8]) -> Option<String> {
    let accepted: AcceptedBody = serde_json::from_slice(body).ok()?;
    match accepted.job_id? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> Pdf4meClient {
        Pdf4meClient::new(ClientConfig::new(Url::parse(base).unwrap(), "key")).unwrap()
    }

    #[test]
    fn test_auth_header_schemes() {
        assert_eq!(AuthScheme::Basic.header_value("abc"), "Basic abc");
        assert_eq!(AuthScheme::Raw.header_value("abc"), "abc");
    }

    #[test]
    fn test_endpoint_url_joins_relative_paths() {
        let client = client("https://api.pdf4me.com/");
        assert_eq!(
            client.endpoint_url("api/v2/SplitPdf").unwrap().as_str(),
            "https://api.pdf4me.com/api/v2/SplitPdf"
        );
        assert_eq!(
            client.endpoint_url("/api/v2/SplitPdf").unwrap().as_str(),
            "https://api.pdf4me.com/api/v2/SplitPdf"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_base_path_prefix() {
        let client = client("http://gateway.local/pdf4me");
        assert_eq!(
            client.endpoint_url("api/v2/Merge").unwrap().as_str(),
            "http://gateway.local/pdf4me/api/v2/Merge"
        );
    }

    #[test]
    fn test_endpoint_url_accepts_absolute_urls() {
        let client = client("https://api.pdf4me.com/");
        assert_eq!(
            client.endpoint_url("http://x/status/1").unwrap().as_str(),
            "http://x/status/1"
        );
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = ClientConfig::new(Url::parse("https://api.pdf4me.com/").unwrap(), "s3cr3t");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_job_id_extraction() {
        assert_eq!(job_id(br#"{"jobId":"abc-123"}"#), Some("abc-123".to_string()));
        assert_eq!(job_id(br#"{"jobId":42}"#), Some("42".to_string()));
        assert_eq!(job_id(br#"{"jobId":""}"#), None);
        assert_eq!(job_id(br#"{"status":"queued"}"#), None);
        assert_eq!(job_id(b"not json"), None);
    }
}
