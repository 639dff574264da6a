//! I/O orchestration around `SyncState`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::mpsc;

use super::countdown::{Countdown, countdown};
use super::state::{RequestToken, ScheduleIndicator, SyncState, ToggleAction};
use super::SyncError;
use crate::agent::{DigestInvoker, InvocationError};
use crate::domain::{DigestResult, ExecutionLogEntry, LOG_PAGE_SIZE, ScheduleStatus, Settings, ValidationError};
use crate::gateway::{GatewayError, ScheduleGateway};
use crate::store::PreferenceStore;

/// Completion reported by a spawned network task.
#[derive(Debug)]
pub enum SyncEvent {
    ScheduleFetched {
        token: RequestToken,
        status: Result<ScheduleStatus, GatewayError>,
        log: Result<Vec<ExecutionLogEntry>, GatewayError>,
    },
    ToggleFinished {
        token: RequestToken,
        result: Result<(), GatewayError>,
    },
    RunFinished {
        token: RequestToken,
        result: Result<DigestResult, InvocationError>,
    },
}

/// Drives the gateway and invoker, and funnels their results into `SyncState`.
pub struct Synchronizer {
    state: SyncState,
    store: PreferenceStore,
    gateway: Arc<dyn ScheduleGateway>,
    invoker: Arc<DigestInvoker>,
    schedule_id: String,
    agent_id: String,
    tx: mpsc::UnboundedSender<SyncEvent>,
    rx: mpsc::UnboundedReceiver<SyncEvent>,
    pending: usize,
}

impl Synchronizer {
    /// Build from persisted settings and digest history.
    pub fn new(
        store: PreferenceStore,
        gateway: Arc<dyn ScheduleGateway>,
        invoker: Arc<DigestInvoker>,
        schedule_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        let state = SyncState::new(store.load(), store.load_digest_state());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            store,
            gateway,
            invoker,
            schedule_id: schedule_id.into(),
            agent_id: agent_id.into(),
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Number of spawned tasks whose completion has not been applied yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Re-fetch status and the log page concurrently.
    pub fn refresh_schedule(&mut self) -> RequestToken {
        let token = self.state.begin_schedule_load();
        let gateway = Arc::clone(&self.gateway);
        let schedule_id = self.schedule_id.clone();
        let tx = self.tx.clone();

        self.pending += 1;
        tokio::spawn(async move {
            let (status, log) = futures::join!(
                gateway.fetch_status(&schedule_id),
                gateway.fetch_recent_log(&schedule_id, LOG_PAGE_SIZE)
            );
            let _ = tx.send(SyncEvent::ScheduleFetched { token, status, log });
        });
        token
    }

    /// Pause an active schedule or resume a paused one. A refresh always follows.
    pub fn toggle_schedule(&mut self) -> Result<ToggleAction, SyncError> {
        let (token, action) = self.state.begin_toggle()?;
        info!("Requesting schedule {}", action.verb());

        let gateway = Arc::clone(&self.gateway);
        let schedule_id = self.schedule_id.clone();
        let tx = self.tx.clone();

        self.pending += 1;
        tokio::spawn(async move {
            let result = match action {
                ToggleAction::Pause => gateway.pause(&schedule_id).await,
                ToggleAction::Resume => gateway.resume(&schedule_id).await,
            };
            let _ = tx.send(SyncEvent::ToggleFinished { token, result });
        });
        Ok(action)
    }

    /// Start a digest run with the saved settings.
    pub fn run_now(&mut self) -> Result<RequestToken, SyncError> {
        let token = self.state.begin_run()?;
        let settings = self.state.settings().clone();
        let invoker = Arc::clone(&self.invoker);
        let agent_id = self.agent_id.clone();
        let tx = self.tx.clone();

        info!("Starting digest run {:?}", token);
        self.pending += 1;
        tokio::spawn(async move {
            let result = invoker.run(&agent_id, &settings).await;
            let _ = tx.send(SyncEvent::RunFinished { token, result });
        });
        Ok(token)
    }

    /// Validate, persist and adopt new settings. Persistence failures are soft.
    pub fn save_settings(&mut self, settings: Settings) -> Result<(), ValidationError> {
        settings.validate()?;
        if let Err(e) = self.store.save(&settings) {
            warn!("Failed to persist settings: {}", e);
            self.state.set_notice(format!("Settings kept for this session only: {}", e));
        }
        self.state.replace_settings(settings);
        Ok(())
    }

    /// Apply one completion. The only place spawned work changes state.
    pub fn apply(&mut self, event: SyncEvent) {
        self.pending = self.pending.saturating_sub(1);
        match event {
            SyncEvent::ScheduleFetched { token, status, log } => {
                self.state.finish_schedule_load(token, status, log);
            }
            SyncEvent::ToggleFinished { token, result } => {
                if self.state.finish_toggle(token, result) {
                    self.refresh_schedule();
                }
            }
            SyncEvent::RunFinished { token, result } => {
                if let Some(history) = self.state.finish_run(token, result) {
                    let saved = self.store.save_digest_state(history);
                    if let Err(e) = saved {
                        warn!("Failed to persist digest history: {}", e);
                        self.state.set_notice(format!("Digest not saved locally: {}", e));
                    }
                }
            }
        }
    }

    /// Apply every completion that has already arrived. Never blocks.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait until no spawned work is outstanding, applying completions as they arrive.
    pub async fn settle(&mut self) {
        while self.pending > 0 {
            match self.rx.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        countdown(self.next_run_time(), now)
    }

    pub fn next_run_time(&self) -> Option<DateTime<Utc>> {
        self.state.schedule().status().and_then(|status| status.next_run_time)
    }

    pub fn can_toggle(&self) -> bool {
        self.state.can_toggle()
    }

    pub fn can_run(&self) -> bool {
        self.state.can_run()
    }

    pub fn schedule_indicator(&self) -> ScheduleIndicator {
        self.state.schedule_indicator()
    }

    pub fn dismiss_notice(&mut self) {
        self.state.clear_notice();
    }
}
