//! Command implementations

pub mod call;
pub mod operations;
pub mod poll;
pub mod profile;
pub mod run;

use std::path::{Path, PathBuf};

use pdf4me_core::Artifact;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::{Pdf4meCtlError, Result as CliResult};
use crate::output;

/// Where a finished artifact goes
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Write the body as-is
    File(PathBuf),
    /// Decode a JSON envelope into one file per document
    ///
    /// With `raw_fallback` a non-JSON body is saved whole next to `dir`
    /// instead of being rejected.
    Directory {
        dir: PathBuf,
        stem: String,
        raw_fallback: bool,
    },
    /// Print a JSON body
    Stdout,
}

impl Target {
    /// Target for `call` and `poll`, which have no input file to name outputs after
    pub fn from_flags(out: Option<&Path>, extract: Option<&Path>) -> Self {
        match (extract, out) {
            (Some(dir), _) => Target::Directory {
                dir: dir.to_path_buf(),
                stem: "document".to_string(),
                raw_fallback: false,
            },
            (None, Some(path)) => Target::File(path.to_path_buf()),
            (None, None) => Target::Stdout,
        }
    }
}

/// Outcome of one submitted job, as printed in summaries
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub input: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u128,
}

/// Write an artifact to its target, returning the paths written
pub async fn save_artifact(
    artifact: &Artifact,
    target: &Target,
    output_format: OutputFormat,
) -> CliResult<Vec<PathBuf>> {
    match target {
        Target::File(path) => {
            artifact.write_to(path).await?;
            debug!("Wrote {} bytes to {}", artifact.len(), path.display());
            Ok(vec![path.clone()])
        }
        Target::Directory {
            dir,
            stem,
            raw_fallback,
        } => {
            if *raw_fallback && !artifact.is_json() {
                let path = raw_sibling(dir, stem, sniff_extension(artifact.bytes()));
                artifact.write_to(&path).await?;
                debug!(
                    "Result is not an envelope; wrote {} bytes to {}",
                    artifact.len(),
                    path.display()
                );
                return Ok(vec![path]);
            }
            let documents = artifact.documents()?;
            let mut written = Vec::with_capacity(documents.len());
            for (index, doc) in documents.iter().enumerate() {
                let fallback = format!("{}-{}.{}", stem, index + 1, sniff_extension(&doc.bytes));
                written.push(doc.write_into(dir, &fallback).await?);
            }
            debug!("Extracted {} document(s) into {}", written.len(), dir.display());
            Ok(written)
        }
        Target::Stdout => {
            if !artifact.is_json() {
                return Err(Pdf4meCtlError::InvalidInput {
                    message: format!(
                        "the result is a {} byte binary document; use --out to save it",
                        artifact.len()
                    ),
                });
            }
            let value = artifact.json()?;
            let fmt = output::OutputFormat::structured(output_format)
                .unwrap_or(output::OutputFormat::Json);
            output::print_output(&value, fmt)?;
            Ok(Vec::new())
        }
    }
}

/// `report.split-pdf` becomes `report.split-pdf.zip`
fn raw_sibling(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    match dir.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push(".");
            name.push(ext);
            dir.with_file_name(name)
        }
        None => dir.join(format!("{}.{}", stem, ext)),
    }
}

/// Parse a JSON argument, reading `@path` from disk
pub async fn read_json_arg(arg: &str) -> CliResult<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            Pdf4meCtlError::FileError {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?,
        None => arg.to_string(),
    };

    serde_json::from_str(&text).map_err(|e| Pdf4meCtlError::InvalidInput {
        message: format!("invalid JSON: {}", e),
    })
}

/// Extension for a decoded document the server did not name
fn sniff_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [b'%', b'P', b'D', b'F', ..] => "pdf",
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'P', b'K', 0x03, 0x04, ..] => "zip",
        _ => "bin",
    }
}

/// Print the written paths of a `call` or `poll`
pub fn print_written(summary: &JobSummary, output_format: OutputFormat) -> CliResult<()> {
    match output::OutputFormat::structured(output_format) {
        Some(fmt) => output::print_output(summary, fmt)?,
        None => {
            for path in &summary.outputs {
                println!("{}", path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf4me_core::encode_base64;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_sniff_extension() {
        assert_eq!(sniff_extension(b"%PDF-1.7"), "pdf");
        assert_eq!(sniff_extension(&[0x89, b'P', b'N', b'G', 0x0D]), "png");
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), "jpg");
        assert_eq!(sniff_extension(b"hello"), "bin");
        assert_eq!(sniff_extension(b""), "bin");
    }

    #[test]
    fn test_target_from_flags() {
        assert_eq!(Target::from_flags(None, None), Target::Stdout);
        assert_eq!(
            Target::from_flags(Some(Path::new("a.pdf")), None),
            Target::File(PathBuf::from("a.pdf"))
        );
        assert!(matches!(
            Target::from_flags(None, Some(Path::new("parts"))),
            Target::Directory { .. }
        ));
    }

    #[tokio::test]
    async fn test_read_json_arg_inline_and_file() {
        assert_eq!(read_json_arg(r#"{"a":1}"#).await.unwrap(), json!({"a": 1}));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"docName":"a.pdf"}"#).unwrap();
        let value = read_json_arg(&format!("@{}", path.display())).await.unwrap();
        assert_eq!(value["docName"], "a.pdf");

        assert!(matches!(
            read_json_arg("not json").await,
            Err(Pdf4meCtlError::InvalidInput { .. })
        ));
        assert!(matches!(
            read_json_arg("@/nonexistent/body.json").await,
            Err(Pdf4meCtlError::FileError { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_envelope_into_directory() {
        let dir = TempDir::new().unwrap();
        let body = json!({
            "splitedDocuments": [
                {"fileName": "part1.pdf", "streamFile": encode_base64(b"%PDF-one")},
                {"streamFile": encode_base64(b"%PDF-two")},
            ]
        });
        let artifact = Artifact::new(
            serde_json::to_vec(&body).unwrap(),
            Some("application/json".to_string()),
        );
        let target = Target::Directory {
            dir: dir.path().join("parts"),
            stem: "report".to_string(),
            raw_fallback: false,
        };

        let written = save_artifact(&artifact, &target, OutputFormat::Auto)
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read(dir.path().join("parts/part1.pdf")).unwrap(), b"%PDF-one");
        assert_eq!(std::fs::read(dir.path().join("parts/report-2.pdf")).unwrap(), b"%PDF-two");
    }

    #[tokio::test]
    async fn test_zip_body_saved_next_to_envelope_directory() {
        let dir = TempDir::new().unwrap();
        let zip = b"PK\x03\x04\x14\x00\x00\x00".to_vec();
        let artifact = Artifact::new(zip.clone(), Some("application/zip".to_string()));
        let target = Target::Directory {
            dir: dir.path().join("report.split-pdf"),
            stem: "report".to_string(),
            raw_fallback: true,
        };

        let written = save_artifact(&artifact, &target, OutputFormat::Auto)
            .await
            .unwrap();

        let expected = dir.path().join("report.split-pdf.zip");
        assert_eq!(written, vec![expected.clone()]);
        assert_eq!(std::fs::read(&expected).unwrap(), zip);
        assert!(!dir.path().join("report.split-pdf").exists());
    }

    #[tokio::test]
    async fn test_extract_rejects_binary_body() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::new(b"%PDF-1.7".to_vec(), Some("application/pdf".to_string()));
        let target = Target::from_flags(None, Some(&dir.path().join("parts")));

        let err = save_artifact(&artifact, &target, OutputFormat::Auto)
            .await
            .unwrap_err();

        assert!(matches!(err, Pdf4meCtlError::ApiError { status: None, .. }));
    }

    #[tokio::test]
    async fn test_binary_to_stdout_is_rejected() {
        let artifact = Artifact::new(b"%PDF-1.7".to_vec(), Some("application/pdf".to_string()));
        let err = save_artifact(&artifact, &Target::Stdout, OutputFormat::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf4meCtlError::InvalidInput { .. }));
    }
}
