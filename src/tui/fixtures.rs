//! Mock collaborators for TUI tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Notify;

use super::app::App;
use crate::agent::{AgentClient, DigestInvoker, InvocationError};
use crate::domain::{DigestHistory, DigestResult, ExecutionLogEntry, Paper, ScheduleStatus};
use crate::gateway::{GatewayError, ScheduleGateway};
use crate::store::PreferenceStore;
use crate::sync::Synchronizer;

pub struct MockGateway {
    fail_status: bool,
    status_calls: AtomicUsize,
    pause_calls: AtomicUsize,
}

impl MockGateway {
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn pause_calls(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleGateway for MockGateway {
    async fn fetch_status(&self, schedule_id: &str) -> Result<ScheduleStatus, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status {
            return Err(GatewayError::Timeout);
        }
        Ok(ScheduleStatus {
            id: schedule_id.to_string(),
            active: true,
            cron_expression: "0 8 * * 1-5".to_string(),
            timezone: "America/New_York".to_string(),
            next_run_time: Some(Utc::now() + TimeDelta::hours(3)),
            last_run_at: None,
        })
    }

    async fn fetch_recent_log(&self, _schedule_id: &str, _limit: usize) -> Result<Vec<ExecutionLogEntry>, GatewayError> {
        if self.fail_status {
            return Err(GatewayError::Timeout);
        }
        Ok(vec![
            ExecutionLogEntry {
                id: "exec-2".to_string(),
                executed_at: Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap(),
                success: false,
                output_summary: "agent timed out".to_string(),
            },
            ExecutionLogEntry {
                id: "exec-1".to_string(),
                executed_at: Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap(),
                success: true,
                output_summary: "digest sent".to_string(),
            },
        ])
    }

    async fn pause(&self, _schedule_id: &str) -> Result<(), GatewayError> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self, _schedule_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

pub struct MockAgent {
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl MockAgent {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentClient for MockAgent {
    async fn invoke(&self, _agent_id: &str, _instruction: &str) -> Result<Value, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let result = serde_json::to_value(digest(10, "ada@example.org"))
            .map_err(|e| InvocationError::Malformed(e.to_string()))?;
        Ok(json!({ "success": true, "result": result }))
    }
}

/// A digest whose execution time is derived from `included`, so distinct values never collide.
pub fn digest(included: u32, email: &str) -> DigestResult {
    DigestResult {
        papers_analyzed: 100,
        papers_included: included,
        top_papers: (0..included.min(4))
            .map(|n| Paper {
                arxiv_id: format!("2410.{:05}", n),
                title: format!("Paper number {}", n),
                authors: "A. Turing, G. Hopper".to_string(),
                summary: format!("Summary of paper {}", n),
                significance: format!("Why paper {} matters", n),
                category: "cs.LG".to_string(),
            })
            .collect(),
        digest_sent: true,
        recipient_email: email.to_string(),
        execution_time: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap() + TimeDelta::hours(included as i64),
    }
}

pub struct Harness {
    dir: TempDir,
    pub gateway: Arc<MockGateway>,
    pub agent: Arc<MockAgent>,
    gate: Arc<Notify>,
}

impl Harness {
    fn build(fail_status: bool, gated: bool) -> Self {
        let gate = Arc::new(Notify::new());
        Self {
            dir: TempDir::new().unwrap(),
            gateway: Arc::new(MockGateway {
                fail_status,
                status_calls: AtomicUsize::new(0),
                pause_calls: AtomicUsize::new(0),
            }),
            agent: Arc::new(MockAgent {
                gate: gated.then(|| gate.clone()),
                calls: AtomicUsize::new(0),
            }),
            gate,
        }
    }

    pub fn new() -> Self {
        Self::build(false, false)
    }

    pub fn failing() -> Self {
        Self::build(true, false)
    }

    pub fn gated() -> Self {
        Self::build(false, true)
    }

    pub fn with_history(entries: Vec<DigestResult>) -> Self {
        let harness = Self::new();
        harness
            .store()
            .save_digest_state(&DigestHistory::from_newest_first(entries))
            .unwrap();
        harness
    }

    pub fn store(&self) -> PreferenceStore {
        PreferenceStore::open(self.dir.path()).unwrap()
    }

    pub fn app(&self) -> App {
        let invoker = Arc::new(DigestInvoker::new(self.agent.clone()));
        let sync = Synchronizer::new(self.store(), self.gateway.clone(), invoker, "sched-1", "agent-1");
        App::new(sync)
    }

    pub fn release_agent(&self) {
        self.gate.notify_one();
    }
}
