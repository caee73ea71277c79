//! `pdf4mectl poll`: resume a job from its Location URL

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use super::{JobSummary, Target, print_written, save_artifact};
use crate::cli::{ConnectionArgs, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::progress::{Progress, cancel_on_ctrl_c};

pub async fn handle_poll(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    location: &str,
    out: Option<&PathBuf>,
    extract: Option<&PathBuf>,
    connection: &ConnectionArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let started = Instant::now();
    let client = conn_mgr.create_client(profile_name, connection)?;
    let session = client.session_for(location)?;
    info!(
        "Polling {} (up to {} attempts)",
        session.location(),
        session.max_attempts()
    );

    let progress = Progress::new(!connection.no_progress);
    let cancel = cancel_on_ctrl_c();
    let artifact = client
        .poll(session, progress.options("job", &cancel))
        .await?;

    let target = Target::from_flags(out.map(PathBuf::as_path), extract.map(PathBuf::as_path));
    let written = save_artifact(&artifact, &target, output_format).await?;
    if target == Target::Stdout {
        return Ok(());
    }

    print_written(
        &JobSummary {
            input: location.to_string(),
            status: "completed",
            outputs: written.iter().map(|p| p.display().to_string()).collect(),
            bytes: artifact.len(),
            location: Some(location.to_string()),
            error: None,
            elapsed_ms: started.elapsed().as_millis(),
        },
        output_format,
    )
}
