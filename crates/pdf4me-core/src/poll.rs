//! Poll strategy, poll sessions and progress reporting for async jobs
//!
//! A 202 answer hands back a `Location` URL which must be polled until the
//! job finishes. The cadence is a [`PollStrategy`] (fixed or exponential
//! delay, bounded attempts); one [`PollSession`] tracks a single job. Callers
//! may pass a [`CancelSignal`] to stop waiting early and a
//! [`ProgressCallback`] to drive spinners.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use url::Url;

use crate::error::{CoreError, Result};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default number of polls before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// How the delay evolves between attempts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Backoff {
    /// Same delay before every attempt
    #[default]
    Fixed,
    /// Delay multiplied by `factor` after every attempt, capped at `max_interval`
    Exponential { factor: f64, max_interval: Duration },
}

/// Poll cadence: delay before each attempt and the attempt budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollStrategy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for PollStrategy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollStrategy {
    /// Fixed-delay strategy
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            backoff: Backoff::Fixed,
        }
    }

    /// Exponential strategy starting at `interval`
    pub fn exponential(
        interval: Duration,
        max_attempts: u32,
        factor: f64,
        max_interval: Duration,
    ) -> Self {
        Self {
            interval,
            max_attempts,
            backoff: Backoff::Exponential {
                factor,
                max_interval,
            },
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to sleep before the given attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                factor,
                max_interval,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let secs = self.interval.as_secs_f64() * factor.max(1.0).powi(exponent);
                let cap = max_interval.max(self.interval);
                if !secs.is_finite() || secs >= cap.as_secs_f64() {
                    cap
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }

    /// Worst-case wall time spent sleeping before the last attempt
    pub fn total_budget(&self) -> Duration {
        (1..=self.max_attempts).map(|n| self.delay_for(n)).sum()
    }
}

/// State of one job being polled
#[derive(Debug, Clone)]
pub struct PollSession {
    location: Url,
    attempt: u32,
    strategy: PollStrategy,
}

impl PollSession {
    pub fn new(location: Url, strategy: PollStrategy) -> Self {
        Self {
            location,
            attempt: 0,
            strategy,
        }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Attempts issued so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.strategy.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.strategy.max_attempts
    }

    /// Advance to the next attempt, returning its number and the delay to
    /// sleep first. `None` once the budget is spent.
    pub fn next_attempt(&mut self) -> Option<(u32, Duration)> {
        if self.is_exhausted() {
            return None;
        }
        self.attempt += 1;
        Some((self.attempt, self.strategy.delay_for(self.attempt)))
    }
}

/// Progress events emitted during an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// POST sent
    Submitted { endpoint: String },
    /// Server answered 202 and handed back a poll URL
    Accepted { location: String },
    /// About to issue a poll
    Polling {
        attempt: u32,
        max_attempts: u32,
        elapsed: Duration,
    },
    /// Artifact received
    Completed { attempts: u32, elapsed: Duration },
    /// Terminal failure
    Failed { error: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Submitted { endpoint } => write!(f, "Submitted to {}", endpoint),
            ProgressEvent::Accepted { .. } => write!(f, "Accepted, processing asynchronously"),
            ProgressEvent::Polling {
                attempt,
                max_attempts,
                ..
            } => write!(f, "Checking status ({}/{})", attempt, max_attempts),
            ProgressEvent::Completed { attempts, elapsed } => write!(
                f,
                "Completed after {} poll(s) in {:.1}s",
                attempts,
                elapsed.as_secs_f64()
            ),
            ProgressEvent::Failed { error } => write!(f, "Failed: {}", error),
        }
    }
}

/// Callback type for progress updates
///
/// The CLI uses this to update spinners; library callers usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Sending half of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half of a cancellation pair, observed by the poll loop
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a connected handle/signal pair
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancelled; never resolves if the handle is dropped first
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `delay`, returning early with `true` if cancelled.
    ///
    /// A dropped handle can never cancel, so the full delay is slept.
    pub async fn sleep(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}

/// Per-call options for the poll loop
#[derive(Default)]
pub struct PollOptions {
    pub on_progress: Option<ProgressCallback>,
    pub cancel: Option<CancelSignal>,
}

impl PollOptions {
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }

    /// Await an HTTP exchange, abandoning it as soon as the caller cancels
    ///
    /// `attempts` is the number of polls already answered.
    pub(crate) async fn guard<T>(
        &mut self,
        request: impl Future<Output = Result<T>>,
        attempts: u32,
    ) -> Result<T> {
        match self.cancel.as_mut() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => Err(CoreError::Cancelled { attempts }),
                result = request => result,
            },
            None => request.await,
        }
    }

    /// Sleep before an attempt; `true` means the caller cancelled
    pub(crate) async fn wait(&mut self, delay: Duration) -> bool {
        match self.cancel.as_mut() {
            Some(signal) => signal.sleep(delay).await,
            None => {
                tokio::time::sleep(delay).await;
                false
            }
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("on_progress", &self.on_progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}
