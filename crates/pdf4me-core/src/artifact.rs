//! Final results of operations and decoding of JSON document envelopes
//!
//! Most endpoints answer with the processed file itself. Several (split,
//! create images, extract attachments, generate multiple documents) answer
//! with JSON that embeds one or more base64 documents instead. Decoding such
//! an envelope is an explicit step: [`Artifact::documents`] fails with
//! [`CoreError::MalformedResponse`] rather than silently falling back to the
//! raw bytes.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CoreError, Result};

/// Fields that carry base64 document content, in lookup order
const CONTENT_KEYS: &[&str] = &["docContent", "streamFile", "docData", "fileContent"];

/// Fields that carry a document file name, in lookup order
const NAME_KEYS: &[&str] = &["docName", "fileName", "name"];

/// Fields that carry a list of documents
const LIST_KEYS: &[&str] = &[
    "splitedDocuments",
    "outputDocuments",
    "documents",
    "attachments",
];

/// Encode bytes as standard base64
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64, tolerating embedded line breaks
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CoreError::MalformedResponse(format!("invalid base64 content: {}", e)))
}

/// The final body of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the server declared JSON, or the body looks like JSON
    pub fn is_json(&self) -> bool {
        if let Some(ct) = &self.content_type {
            return ct.to_ascii_lowercase().contains("json");
        }
        matches!(
            self.bytes.iter().find(|b| !b.is_ascii_whitespace()),
            Some(b'{') | Some(b'[')
        )
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.bytes)
            .map_err(|e| CoreError::MalformedResponse(format!("response is not valid JSON: {}", e)))
    }

    /// Decode the base64 documents embedded in a JSON envelope
    pub fn documents(&self) -> Result<Vec<DecodedDocument>> {
        let value = self.json()?;
        decode_envelope(&value)
    }

    /// Write the body verbatim
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        write_file(path, &self.bytes).await
    }
}

/// A document recovered from a JSON envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDocument {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl DecodedDocument {
    /// File name to use inside an output directory.
    ///
    /// Only the final path component of a server-supplied name is kept.
    pub fn file_name(&self, fallback: &str) -> String {
        self.name
            .as_deref()
            .and_then(|n| Path::new(n).file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Write into `dir`, returning the path written
    pub async fn write_into(&self, dir: &Path, fallback: &str) -> Result<PathBuf> {
        let path = dir.join(self.file_name(fallback));
        write_file(&path, &self.bytes).await?;
        Ok(path)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| CoreError::io(path, e))
}

/// Decode every document in an envelope value
pub fn decode_envelope(value: &Value) -> Result<Vec<DecodedDocument>> {
    match value {
        Value::Array(items) => decode_list(items, "top-level array"),
        Value::Object(map) => decode_object(map),
        other => Err(CoreError::MalformedResponse(format!(
            "expected a JSON object or array, got {}",
            json_kind(other)
        ))),
    }
}

fn decode_object(map: &Map<String, Value>) -> Result<Vec<DecodedDocument>> {
    for key in LIST_KEYS {
        if let Some(Value::Array(items)) = map.get(*key) {
            debug!("Decoding {} document(s) from '{}'", items.len(), key);
            return decode_list(items, key);
        }
    }

    if let Some(doc) = decode_item(map, "response")? {
        return Ok(vec![doc]);
    }

    if let Some(Value::Object(inner)) = map.get("document")
        && let Some(doc) = decode_item(inner, "document")?
    {
        return Ok(vec![doc]);
    }

    if let Some(Value::String(data)) = map.get("data") {
        return Ok(vec![DecodedDocument {
            name: None,
            bytes: decode_base64(data)?,
        }]);
    }

    let mut keys: Vec<_> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    Err(CoreError::MalformedResponse(format!(
        "no document content found in JSON response (keys: {})",
        keys.join(", ")
    )))
}

fn decode_list(items: &[Value], source: &str) -> Result<Vec<DecodedDocument>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let context = format!("{} item {}", source, i + 1);
            match item {
                Value::Object(map) => decode_item(map, &context)?.ok_or_else(|| {
                    CoreError::MalformedResponse(format!("{} has no document content", context))
                }),
                other => Err(CoreError::MalformedResponse(format!(
                    "{} is {}, expected an object",
                    context,
                    json_kind(other)
                ))),
            }
        })
        .collect()
}

/// `Ok(None)` when the object has no content field at all
fn decode_item(map: &Map<String, Value>, context: &str) -> Result<Option<DecodedDocument>> {
    let Some((key, content)) = CONTENT_KEYS
        .iter()
        .find_map(|k| map.get(*k).map(|v| (*k, v)))
    else {
        return Ok(None);
    };

    let Value::String(encoded) = content else {
        return Err(CoreError::MalformedResponse(format!(
            "'{}' in {} is {}, expected a base64 string",
            key,
            context,
            json_kind(content)
        )));
    };

    let bytes = decode_base64(encoded).map_err(|e| match e {
        CoreError::MalformedResponse(msg) => {
            CoreError::MalformedResponse(format!("'{}' in {}: {}", key, context, msg))
        }
        other => other,
    })?;

    let name = NAME_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_string);

    Ok(Some(DecodedDocument { name, bytes }))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
