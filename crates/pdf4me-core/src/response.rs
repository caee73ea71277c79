//! HTTP responses and their classification
//!
//! The PDF4me protocol has exactly three kinds of answer: the artifact is
//! ready (200), the job is still running (202), or something went wrong.

use reqwest::header::{CONTENT_TYPE, LOCATION};

/// Classification of a single HTTP answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 200: the body is the final artifact
    Success,
    /// 202: the job is still processing
    Pending,
    /// Anything else: terminal error
    Failed,
}

impl Outcome {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Outcome::Success,
            202 => Outcome::Pending,
            _ => Outcome::Failed,
        }
    }
}

/// One HTTP answer, captured in full
#[derive(Debug, Clone)]
pub struct OperationResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub location: Option<String>,
    pub content_type: Option<String>,
}

impl OperationResponse {
    /// Drain a reqwest response into an owned value
    pub(crate) async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let location = header_string(&response, LOCATION.as_str());
        let content_type = header_string(&response, CONTENT_TYPE.as_str());
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            body,
            location,
            content_type,
        })
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_status(self.status)
    }

    /// Body as lossy UTF-8, for diagnostics
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
