//! Mirrors of the remote scheduler's records.
//!
//! These are read-through caches. Nothing in this crate mutates them
//! locally; a fresh copy always comes from the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of execution log entries shown on the dashboard.
pub const LOG_PAGE_SIZE: usize = 5;

/// Canonical schedule record, whatever shape the remote sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub id: String,
    pub active: bool,
    pub cron_expression: String,
    pub timezone: String,
    pub next_run_time: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// One past scheduled invocation and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: String,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
    pub output_summary: String,
}
