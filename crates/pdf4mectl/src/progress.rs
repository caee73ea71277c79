//! Progress spinners and Ctrl-C cancellation for long-running jobs

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use pdf4me_core::{CancelSignal, PollOptions, ProgressCallback, ProgressEvent};
use tracing::{debug, warn};

/// Spinners for one command, one per job
pub struct Progress {
    bars: Option<MultiProgress>,
}

impl Progress {
    /// Spinners are hidden when disabled or when stderr is not a terminal
    pub fn new(enabled: bool) -> Self {
        let bars = enabled.then(|| {
            let multi = MultiProgress::new();
            if !console_attached() {
                multi.set_draw_target(ProgressDrawTarget::hidden());
            }
            multi
        });
        Self { bars }
    }

    /// Poll options reporting into a new spinner labelled `label`
    pub fn options(&self, label: &str, cancel: &CancelSignal) -> PollOptions {
        let options = PollOptions::default().with_cancel(cancel.clone());
        match &self.bars {
            Some(multi) => options.with_progress(spinner_callback(multi, label)),
            None => options,
        }
    }
}

fn console_attached() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

fn spinner_callback(multi: &MultiProgress, label: &str) -> ProgressCallback {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("{}: submitting", label));

    let label = label.to_string();
    Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Completed { .. } => {
            pb.finish_with_message(format!("{}: {}", label, event));
        }
        ProgressEvent::Failed { .. } => {
            pb.abandon_with_message(format!("{}: {}", label, event));
        }
        _ => pb.set_message(format!("{}: {}", label, event)),
    }) as ProgressCallback
}

/// Cancellation signal that fires on Ctrl-C
///
/// The poll loop stops before its next status check and reports how many
/// checks were made.
pub fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, cancelling polling");
                handle.cancel();
            }
            Err(e) => debug!("Could not listen for Ctrl-C: {}", e),
        }
    });
    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_has_no_callback() {
        let (_handle, signal) = CancelSignal::pair();
        let options = Progress::new(false).options("a.pdf", &signal);
        assert!(options.on_progress.is_none());
        assert!(options.cancel.is_some());
    }

    #[test]
    fn test_enabled_progress_accepts_events() {
        let (_handle, signal) = CancelSignal::pair();
        let options = Progress::new(true).options("a.pdf", &signal);
        let callback = options.on_progress.expect("spinner callback");
        callback(ProgressEvent::Submitted {
            endpoint: "api/v2/Optimize".to_string(),
        });
        callback(ProgressEvent::Completed {
            attempts: 1,
            elapsed: Duration::from_millis(5),
        });
    }
}
