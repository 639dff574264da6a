//! Remote payload shapes and their normalization.
//!
//! Two scheduler deployments disagree on field names: one reports
//! `is_active: bool`, the other `status: "active" | "paused"`; cron and
//! timestamp fields have aliases too. Everything is folded into the
//! canonical domain types here so nothing past the gateway sees the drift.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::Deserialize;

use super::GatewayError;
use crate::domain::{ExecutionLogEntry, ScheduleStatus};

/// `{ success, schedule?, error? }`
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub success: bool,
    #[serde(default, alias = "data")]
    pub schedule: Option<RawSchedule>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `{ success, executions?, error? }`
#[derive(Debug, Deserialize)]
pub(crate) struct LogEnvelope {
    pub success: bool,
    #[serde(default, alias = "logs")]
    pub executions: Option<Vec<RawLogEntry>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `{ success, error? }` for pause / resume.
#[derive(Debug, Deserialize)]
pub(crate) struct AckEnvelope {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSchedule {
    id: String,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    status: Option<String>,
    #[serde(alias = "cron")]
    cron_expression: String,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default, alias = "next_run_at")]
    next_run_time: Option<String>,
    #[serde(default, alias = "last_run_time")]
    last_run_at: Option<String>,
}

impl RawSchedule {
    pub fn normalize(self) -> Result<ScheduleStatus, GatewayError> {
        let active = match (self.is_active, self.status.as_deref()) {
            (Some(flag), _) => flag,
            (None, Some(status)) => parse_status(status)?,
            (None, None) => {
                return Err(GatewayError::InvalidResponse(format!(
                    "schedule {} has neither is_active nor status",
                    self.id
                )));
            }
        };

        Ok(ScheduleStatus {
            next_run_time: optional_timestamp("next_run_time", self.next_run_time.as_deref()),
            last_run_at: optional_timestamp("last_run_at", self.last_run_at.as_deref()),
            id: self.id,
            active,
            cron_expression: self.cron_expression,
            timezone: self.timezone.unwrap_or_else(|| "UTC".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLogEntry {
    id: String,
    executed_at: String,
    success: bool,
    #[serde(default, alias = "response_output")]
    output_summary: Option<String>,
}

impl RawLogEntry {
    pub fn normalize(self) -> Result<ExecutionLogEntry, GatewayError> {
        let executed_at = parse_timestamp(&self.executed_at).ok_or_else(|| {
            GatewayError::InvalidResponse(format!("log entry {} has bad executed_at {:?}", self.id, self.executed_at))
        })?;

        Ok(ExecutionLogEntry {
            id: self.id,
            executed_at,
            success: self.success,
            output_summary: self.output_summary.unwrap_or_default(),
        })
    }
}

/// Normalize a log page: newest first, at most `limit` entries.
pub(crate) fn normalize_log(raw: Vec<RawLogEntry>, limit: usize) -> Result<Vec<ExecutionLogEntry>, GatewayError> {
    let mut entries = raw
        .into_iter()
        .map(RawLogEntry::normalize)
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
    entries.truncate(limit);
    Ok(entries)
}

fn parse_status(status: &str) -> Result<bool, GatewayError> {
    match status.to_ascii_lowercase().as_str() {
        "active" | "enabled" | "running" => Ok(true),
        "paused" | "inactive" | "disabled" | "stopped" => Ok(false),
        other => Err(GatewayError::InvalidResponse(format!("unknown schedule status {:?}", other))),
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn optional_timestamp(field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!("Ignoring unparseable {} {:?}", field, raw);
    }
    parsed
}
