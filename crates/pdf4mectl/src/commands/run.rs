//! `pdf4mectl run`: catalog operations on local files
//!
//! Single-document operations given several files run as a batch, one job
//! per file, with at most `--concurrency` jobs in flight. Operations that
//! take several documents (merge, overlay) run as one job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use colored::Colorize;
use futures::stream::{self, StreamExt};
use pdf4me_core::{
    Artifact, CancelSignal, DocumentInput, Operation, OperationRequest, OutputKind, Pdf4meClient,
    PollOptions, Submission,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{JobSummary, Target, read_json_arg, save_artifact};
use crate::cli::{OutputFormat, RunArgs};
use crate::connection::ConnectionManager;
use crate::error::{Pdf4meCtlError, Result as CliResult};
use crate::output;
use crate::progress::{Progress, cancel_on_ctrl_c};

/// Settings shared by every job of one `run`
struct JobContext<'a> {
    client: Pdf4meClient,
    args: &'a RunArgs,
    options: Map<String, Value>,
    file_options: Vec<(String, DocumentInput)>,
    output_format: OutputFormat,
}

pub async fn handle_run(
    args: &RunArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let operation = args.operation;
    let (_, max_inputs) = operation.input().arity();
    let batch = max_inputs == Some(1) && args.files.len() > 1;

    if batch && args.doc_name.is_some() {
        return Err(Pdf4meCtlError::InvalidInput {
            message: "--doc-name cannot be combined with several input files".to_string(),
        });
    }

    let ctx = JobContext {
        client: conn_mgr.create_client(profile_name, &args.connection)?,
        args,
        options: collect_options(args.options.as_deref(), &args.set).await?,
        file_options: load_file_options(&args.set_file).await?,
        output_format,
    };

    let jobs: Vec<Vec<PathBuf>> = if batch {
        args.files.iter().map(|f| vec![f.clone()]).collect()
    } else {
        vec![args.files.clone()]
    };
    let targets: Vec<Target> = jobs
        .iter()
        .map(|files| output_target(operation, files, args.out.as_deref(), args.extract, batch))
        .collect();
    check_distinct_targets(&jobs, &targets)?;

    let concurrency = if batch { usize::from(args.concurrency) } else { 1 };
    info!(
        "Running {} as {} job(s), concurrency {}",
        operation,
        jobs.len(),
        concurrency
    );

    let progress = Progress::new(!args.connection.no_progress);
    let cancel = cancel_on_ctrl_c();

    let ctx = &ctx;
    let progress = &progress;
    let cancel = &cancel;
    let mut results: Vec<(usize, CliResult<JobSummary>)> =
        stream::iter(jobs.iter().zip(&targets).enumerate())
            .map(|(index, (files, target))| async move {
                (index, run_job(ctx, files, target, progress, cancel).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
    results.sort_by_key(|(index, _)| *index);

    if !batch {
        let (_, result) = results.pop().ok_or_else(|| Pdf4meCtlError::InvalidInput {
            message: "nothing to run".to_string(),
        })?;
        let summary = result?;
        print_summaries(std::slice::from_ref(&summary), output_format)?;
        return Ok(());
    }

    let total = results.len();
    let mut summaries = Vec::with_capacity(total);
    let mut failed = 0;
    for ((_, result), file) in results.into_iter().zip(&args.files) {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                failed += 1;
                warn!("{} failed: {}", file.display(), e);
                summaries.push(JobSummary {
                    input: file.display().to_string(),
                    status: "failed",
                    outputs: Vec::new(),
                    bytes: 0,
                    location: None,
                    error: Some(e.to_string()),
                    elapsed_ms: 0,
                });
            }
        }
    }
    print_summaries(&summaries, output_format)?;

    if failed > 0 {
        return Err(Pdf4meCtlError::BatchFailed { failed, total });
    }
    Ok(())
}

async fn run_job(
    ctx: &JobContext<'_>,
    files: &[PathBuf],
    target: &Target,
    progress: &Progress,
    cancel: &CancelSignal,
) -> CliResult<JobSummary> {
    let started = Instant::now();
    let operation = ctx.args.operation;
    let label = files
        .first()
        .map(|f| f.display().to_string())
        .unwrap_or_else(|| operation.to_string());

    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        inputs.push(DocumentInput::from_path(file).await?);
    }

    let mut builder = OperationRequest::builder(operation)
        .documents(inputs)
        .options(ctx.options.clone())
        .asynchronous(!ctx.args.sync);
    for (key, input) in &ctx.file_options {
        builder = builder.file_option(key.clone(), input);
    }
    if let Some(name) = &ctx.args.doc_name {
        builder = builder.doc_name(name.clone());
    }
    let request = builder.build()?;

    debug!("{} -> {:?}", label, target);

    let artifact = if ctx.args.no_wait {
        match ctx.client.submit(request.endpoint(), request.body()).await? {
            Submission::Completed(response) => Artifact::new(response.body, response.content_type),
            Submission::Accepted(session) => {
                return Ok(JobSummary {
                    input: label,
                    status: "accepted",
                    outputs: Vec::new(),
                    bytes: 0,
                    location: Some(session.location().to_string()),
                    error: None,
                    elapsed_ms: started.elapsed().as_millis(),
                });
            }
        }
    } else {
        let options: PollOptions = progress.options(&label, cancel);
        ctx.client.run_with(&request, options).await?
    };

    let written = save_artifact(&artifact, target, ctx.output_format).await?;

    Ok(JobSummary {
        input: label,
        status: "completed",
        outputs: written.iter().map(|p| p.display().to_string()).collect(),
        bytes: artifact.len(),
        location: None,
        error: None,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

/// Merge `--options` and `--set` into one options object; `--set` wins
async fn collect_options(options: Option<&str>, set: &[String]) -> CliResult<Map<String, Value>> {
    let mut merged = match options {
        Some(arg) => match read_json_arg(arg).await? {
            Value::Object(map) => map,
            other => {
                return Err(Pdf4meCtlError::InvalidInput {
                    message: format!("--options must be a JSON object, got {}", other),
                });
            }
        },
        None => Map::new(),
    };

    for pair in set {
        let (key, value) = split_pair(pair, "--set")?;
        merged.insert(key.to_string(), parse_option_value(value));
    }
    Ok(merged)
}

/// Values are taken as JSON when they parse, otherwise as plain strings
fn parse_option_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn load_file_options(pairs: &[String]) -> CliResult<Vec<(String, DocumentInput)>> {
    let mut loaded = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (key, path) = split_pair(pair, "--set-file")?;
        loaded.push((key.to_string(), DocumentInput::from_path(path).await?));
    }
    Ok(loaded)
}

fn split_pair<'a>(pair: &'a str, flag: &str) -> CliResult<(&'a str, &'a str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(Pdf4meCtlError::InvalidInput {
            message: format!("{} expects KEY=VALUE, got '{}'", flag, pair),
        }),
    }
}

/// Where the result of one job is written
///
/// Without `--out`, results land next to the first input as
/// `<stem>.<operation>.<ext>`. In a batch, `--out` names a directory.
fn output_target(
    operation: Operation,
    files: &[PathBuf],
    out: Option<&Path>,
    extract: bool,
    batch: bool,
) -> Target {
    let first = files.first();
    let stem = first
        .and_then(|f| f.file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| operation.to_string());
    let input_dir = first
        .and_then(|f| f.parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if extract || operation.output() == OutputKind::Envelope {
        let dir = match out {
            Some(out) if batch => out.join(&stem),
            Some(out) => out.to_path_buf(),
            None if first.is_some() => input_dir.join(format!("{}.{}", stem, operation)),
            None => PathBuf::from(operation.to_string()),
        };
        return Target::Directory {
            dir,
            stem,
            raw_fallback: !extract,
        };
    }

    let ext = operation
        .default_extension()
        .map(str::to_string)
        .or_else(|| {
            first
                .and_then(|f| f.extension())
                .map(|e| e.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "pdf".to_string());

    let path = match out {
        Some(out) if batch => out.join(format!("{}.{}", stem, ext)),
        Some(out) => out.to_path_buf(),
        None if first.is_some() => input_dir.join(format!("{}.{}.{}", stem, operation, ext)),
        None => PathBuf::from(format!("{}.{}", operation, ext)),
    };
    Target::File(path)
}

/// Refuse a batch in which two inputs would write to the same place
///
/// Same-named files from different directories collide under one `--out`.
fn check_distinct_targets(jobs: &[Vec<PathBuf>], targets: &[Target]) -> CliResult<()> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for (files, target) in jobs.iter().zip(targets) {
        let destination = match target {
            Target::File(path) => path.as_path(),
            Target::Directory { dir, .. } => dir.as_path(),
            Target::Stdout => continue,
        };
        let Some(input) = files.first() else {
            continue;
        };
        if let Some(previous) = seen.insert(destination, input) {
            return Err(Pdf4meCtlError::InvalidInput {
                message: format!(
                    "{} and {} would both be written to {}; run them separately",
                    previous.display(),
                    input.display(),
                    destination.display()
                ),
            });
        }
    }
    Ok(())
}

fn print_summaries(summaries: &[JobSummary], output_format: OutputFormat) -> CliResult<()> {
    if let Some(fmt) = output::OutputFormat::structured(output_format) {
        output::print_output(summaries, fmt)?;
        return Ok(());
    }

    for summary in summaries {
        match summary.status {
            "completed" => println!(
                "{} {} -> {} ({} bytes, {:.1}s)",
                "✓".green(),
                summary.input,
                summary.outputs.join(", "),
                summary.bytes,
                summary.elapsed_ms as f64 / 1000.0
            ),
            "accepted" => println!(
                "{} {} accepted; resume with:\n    pdf4mectl poll {}",
                "…".yellow(),
                summary.input,
                summary.location.as_deref().unwrap_or_default()
            ),
            _ => println!(
                "{} {}: {}",
                "✗".red(),
                summary.input,
                summary.error.as_deref().unwrap_or("failed")
            ),
        }
    }
    Ok(())
}
