//! Polling configuration stored in profiles
//!
//! Maps the `[profiles.<name>.polling]` table onto a [`PollStrategy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poll::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollStrategy};

/// Delay growth between poll attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Poll cadence for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds to wait before each status check
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Status checks before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Multiplier applied per attempt with exponential backoff
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single delay with exponential backoff
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
            backoff: BackoffKind::Fixed,
            backoff_factor: default_backoff_factor(),
            max_interval_secs: default_max_interval_secs(),
        }
    }
}

impl PollingConfig {
    pub fn strategy(&self) -> PollStrategy {
        let interval = Duration::from_secs(self.interval_secs);
        match self.backoff {
            BackoffKind::Fixed => PollStrategy::fixed(interval, self.max_attempts),
            BackoffKind::Exponential => PollStrategy::exponential(
                interval,
                self.max_attempts,
                self.backoff_factor,
                Duration::from_secs(self.max_interval_secs),
            ),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_interval_secs() -> u64 {
    60
}
