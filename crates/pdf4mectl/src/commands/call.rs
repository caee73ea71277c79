//! `pdf4mectl call`: any endpoint with a raw JSON body

use std::path::PathBuf;
use std::time::Instant;

use serde_json::json;
use tracing::info;

use super::{JobSummary, Target, print_written, read_json_arg, save_artifact};
use crate::cli::{ConnectionArgs, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::progress::{Progress, cancel_on_ctrl_c};

#[allow(clippy::too_many_arguments)]
pub async fn handle_call(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    endpoint: &str,
    data: Option<&str>,
    out: Option<&PathBuf>,
    extract: Option<&PathBuf>,
    connection: &ConnectionArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let started = Instant::now();
    let client = conn_mgr.create_client(profile_name, connection)?;
    let body = match data {
        Some(arg) => read_json_arg(arg).await?,
        None => json!({}),
    };
    info!("Calling {}", endpoint);

    let progress = Progress::new(!connection.no_progress);
    let cancel = cancel_on_ctrl_c();
    let artifact = client
        .execute_with(endpoint, &body, progress.options(endpoint, &cancel))
        .await?;

    let target = Target::from_flags(out.map(PathBuf::as_path), extract.map(PathBuf::as_path));
    let written = save_artifact(&artifact, &target, output_format).await?;
    if target == Target::Stdout {
        return Ok(());
    }

    print_written(
        &JobSummary {
            input: endpoint.to_string(),
            status: "completed",
            outputs: written.iter().map(|p| p.display().to_string()).collect(),
            bytes: artifact.len(),
            location: None,
            error: None,
            elapsed_ms: started.elapsed().as_millis(),
        },
        output_format,
    )
}
