//! # pdf4me-core
//!
//! Shared engine for `pdf4mectl`: profile configuration, the async
//! request/poll client, the operation catalog and artifact decoding.
//!
//! PDF4me runs long jobs asynchronously. A POST answers either 200 with the
//! finished document or 202 with a `Location` header to poll. The
//! [`Pdf4meClient`] hides that difference: every operation resolves to an
//! [`Artifact`] or a [`CoreError`].
//!
//! ```rust,no_run
//! use pdf4me_core::{Config, DocumentInput, Operation, OperationRequest, Pdf4meClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let (_, profile) = config.profile(None)?;
//! let client = Pdf4meClient::new(profile.client_config()?)?;
//!
//! let request = OperationRequest::builder(Operation::Compress)
//!     .document(DocumentInput::from_path("report.pdf").await?)
//!     .option("optimizeProfile", "web")
//!     .build()?;
//!
//! let artifact = client.run(&request).await?;
//! artifact.write_to("report.compressed.pdf".as_ref()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`client`] - submit, poll and classify
//! - [`poll`] - poll strategy, cancellation and progress events
//! - [`operation`] - the endpoint catalog
//! - [`request`] - payload builder
//! - [`artifact`] - final bodies and JSON document envelopes
//! - [`config`] - TOML profiles and credential resolution

pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod poll;
pub mod request;
pub mod response;

pub use artifact::{Artifact, DecodedDocument, decode_base64, encode_base64};
pub use client::{AuthScheme, ClientConfig, PDF4ME_USER_AGENT, Pdf4meClient, Submission};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use operation::{Category, InputKind, Operation, OperationSpec, OutputKind};
pub use poll::{
    Backoff, CancelHandle, CancelSignal, PollOptions, PollSession, PollStrategy,
    ProgressCallback, ProgressEvent,
};
pub use request::{DocumentInput, OperationRequest, OperationRequestBuilder};
pub use response::{OperationResponse, Outcome};
