//! Request payloads for catalog operations
//!
//! Input files are base64-encoded into the fields their [`InputKind`]
//! expects. Every other field of an endpoint's schema is an opaque option
//! supplied by the caller and merged into the JSON body as-is.
//!
//! # Example
//!
//! ```rust
//! use pdf4me_core::{DocumentInput, Operation, OperationRequest};
//! use serde_json::json;
//!
//! let request = OperationRequest::builder(Operation::AddTextStamp)
//!     .document(DocumentInput::from_bytes("report.pdf", b"%PDF-1.7".to_vec()))
//!     .option("text", "CONFIDENTIAL")
//!     .option("pages", "all")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.endpoint(), "api/v2/Stamp");
//! assert_eq!(request.body()["docName"], json!("report.pdf"));
//! assert_eq!(request.body()["async"], json!(true));
//! ```

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::artifact::encode_base64;
use crate::error::{CoreError, Result};
use crate::operation::{InputKind, Operation};

/// A local file to send to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    name: String,
    bytes: Vec<u8>,
}

impl DocumentInput {
    /// Read a file; its base name becomes the document name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::io(path, e))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self { name, bytes })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&self.bytes)
    }
}

/// File fields of a request body, one shape per [`InputKind`]
#[derive(Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
enum FilePayload {
    Single {
        doc_content: String,
        doc_name: String,
    },
    Multiple {
        doc_content: Vec<String>,
        doc_name: String,
    },
    Overlay {
        base_doc_content: String,
        base_doc_name: String,
        layer_doc_content: String,
        layer_doc_name: String,
    },
    Template {
        template_file_data: String,
        template_file_name: String,
    },
}

/// Full JSON body; options are serialized last and win on key clashes
#[derive(Serialize)]
struct RequestBody<'a> {
    #[serde(flatten)]
    files: Option<FilePayload>,
    #[serde(rename = "async")]
    asynchronous: bool,
    #[serde(flatten)]
    options: &'a Map<String, Value>,
}

/// A fully built, immutable request
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    operation: Option<Operation>,
    endpoint: String,
    body: Value,
    output_name: Option<String>,
}

impl OperationRequest {
    pub fn builder(operation: Operation) -> OperationRequestBuilder {
        OperationRequestBuilder::new(operation)
    }

    /// Pass-through request for an endpoint outside the catalog
    pub fn raw(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            operation: None,
            endpoint: endpoint.into(),
            body,
            output_name: None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Name of the primary input, used to derive output file names
    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }
}

/// Builder for [`OperationRequest`]
#[derive(Debug, Clone)]
pub struct OperationRequestBuilder {
    operation: Operation,
    inputs: Vec<DocumentInput>,
    doc_name: Option<String>,
    options: Map<String, Value>,
    asynchronous: bool,
}

impl OperationRequestBuilder {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            inputs: Vec::new(),
            doc_name: None,
            options: Map::new(),
            asynchronous: true,
        }
    }

    pub fn document(mut self, input: DocumentInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn documents(mut self, inputs: impl IntoIterator<Item = DocumentInput>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Override `docName` (defaults to the first input's name)
    pub fn doc_name(mut self, name: impl Into<String>) -> Self {
        self.doc_name = Some(name.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options.extend(options);
        self
    }

    /// Embed an extra file (e.g. `imageFile`) as a base64 option
    pub fn file_option(self, key: impl Into<String>, input: &DocumentInput) -> Self {
        let encoded = input.to_base64();
        self.option(key, encoded)
    }

    /// Ask the server for 202 + Location processing (default `true`)
    pub fn asynchronous(mut self, enabled: bool) -> Self {
        self.asynchronous = enabled;
        self
    }

    pub fn build(self) -> Result<OperationRequest> {
        let kind = self.operation.input();
        let (min, max) = kind.arity();
        let count = self.inputs.len();

        if count < min || max.is_some_and(|max| count > max) {
            return Err(CoreError::Validation(format!(
                "{} expects {}, got {} file(s)",
                self.operation,
                describe_arity(min, max),
                count
            )));
        }

        if let Some(key) = self.options.keys().find(|k| k.trim().is_empty()) {
            return Err(CoreError::Validation(format!(
                "option name '{}' is empty",
                key
            )));
        }

        let output_name = self
            .doc_name
            .clone()
            .or_else(|| self.inputs.first().map(|i| i.name.clone()));
        let files = self.file_payload(kind);

        let body = serde_json::to_value(RequestBody {
            files,
            asynchronous: self.asynchronous,
            options: &self.options,
        })
        .map_err(|e| CoreError::Validation(format!("could not serialize request: {}", e)))?;

        debug!(
            "Built {} request with {} file(s) and {} option(s)",
            self.operation,
            count,
            self.options.len()
        );

        Ok(OperationRequest {
            operation: Some(self.operation),
            endpoint: self.operation.endpoint().to_string(),
            body,
            output_name,
        })
    }

    fn file_payload(&self, kind: InputKind) -> Option<FilePayload> {
        let name_of = |i: usize| {
            self.doc_name
                .clone()
                .unwrap_or_else(|| self.inputs[i].name.clone())
        };

        match kind {
            InputKind::None => None,
            InputKind::Document => Some(FilePayload::Single {
                doc_content: self.inputs[0].to_base64(),
                doc_name: name_of(0),
            }),
            InputKind::Documents => Some(FilePayload::Multiple {
                doc_content: self.inputs.iter().map(DocumentInput::to_base64).collect(),
                doc_name: name_of(0),
            }),
            InputKind::Overlay => Some(FilePayload::Overlay {
                base_doc_content: self.inputs[0].to_base64(),
                base_doc_name: self.inputs[0].name.clone(),
                layer_doc_content: self.inputs[1].to_base64(),
                layer_doc_name: self.inputs[1].name.clone(),
            }),
            InputKind::Template => Some(FilePayload::Template {
                template_file_data: self.inputs[0].to_base64(),
                template_file_name: name_of(0),
            }),
        }
    }
}

fn describe_arity(min: usize, max: Option<usize>) -> String {
    match (min, max) {
        (0, Some(0)) => "no input files".to_string(),
        (n, Some(m)) if n == m => format!("exactly {} file(s)", n),
        (n, None) => format!("at least {} files", n),
        (n, Some(m)) => format!("{} to {} files", n, m),
    }
}
