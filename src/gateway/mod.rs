//! Remote Schedule Gateway - thin client for the external scheduler
//!
//! This module provides:
//! - `ScheduleGateway` trait for the four scheduler operations
//! - `HttpScheduleGateway` implementation over reqwest
//! - Normalization of the remote schedule shapes into `ScheduleStatus`
//! - `humanize_cron` for display
//!
//! The remote scheduler owns the schedule record. Nothing here caches or
//! flips it locally; callers re-fetch after every pause or resume.

mod cron;
mod http;
mod wire;

use async_trait::async_trait;

use crate::domain::{ExecutionLogEntry, ScheduleStatus};

pub use cron::humanize_cron;
pub use http::{HttpGatewayConfig, HttpScheduleGateway};

/// Operations offered by the external scheduler.
#[async_trait]
pub trait ScheduleGateway: Send + Sync {
    /// Fetch the current schedule record.
    async fn fetch_status(&self, schedule_id: &str) -> Result<ScheduleStatus, GatewayError>;

    /// Fetch at most `limit` execution log entries, newest first.
    async fn fetch_recent_log(&self, schedule_id: &str, limit: usize) -> Result<Vec<ExecutionLogEntry>, GatewayError>;

    /// Ask the scheduler to stop triggering runs.
    async fn pause(&self, schedule_id: &str) -> Result<(), GatewayError>;

    /// Ask the scheduler to start triggering runs again.
    async fn resume(&self, schedule_id: &str) -> Result<(), GatewayError>;
}

/// Errors that can occur talking to the scheduler
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Scheduler reported failure: {0}")]
    Remote(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Network(err)
        }
    }
}

impl GatewayError {
    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout => true,
            GatewayError::Network(_) => true,
            GatewayError::Api { status, .. } => *status >= 500,
            GatewayError::Remote(_) => false,
            GatewayError::InvalidResponse(_) => false,
        }
    }
}
