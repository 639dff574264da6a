//! Domain types for Paperboy.
//!
//! - `Settings`: what the user configures
//! - `DigestResult` / `DigestHistory`: what a run produces and what we keep
//! - `ScheduleStatus` / `ExecutionLogEntry`: mirrors of the remote scheduler

pub mod digest;
pub mod schedule;
pub mod settings;

pub use digest::{DigestHistory, DigestResult, HISTORY_CAP, Paper};
pub use schedule::{ExecutionLogEntry, LOG_PAGE_SIZE, ScheduleStatus};
pub use settings::{
    Category, FieldIssue, PAPER_LIMIT_MAX, PAPER_LIMIT_MIN, Settings, SettingsField, SummaryDepth, ValidationError,
};
