//! The application-state object and its transition functions.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use super::SyncError;
use crate::agent::InvocationError;
use crate::domain::{DigestHistory, DigestResult, ExecutionLogEntry, ScheduleStatus, Settings};
use crate::gateway::GatewayError;

/// Monotonic marker identifying one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// A successfully loaded schedule record and its log page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSnapshot {
    pub status: ScheduleStatus,
    pub log: Vec<ExecutionLogEntry>,
    /// Set when the status loaded but the log fetch failed; `log` is then the previous page.
    pub log_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScheduleAxis {
    #[default]
    Idle,
    Loading {
        token: RequestToken,
        last_good: Option<ScheduleSnapshot>,
    },
    Loaded(ScheduleSnapshot),
    Failed {
        last_good: Option<ScheduleSnapshot>,
        error: String,
    },
}

impl ScheduleAxis {
    /// The newest snapshot known, stale or not.
    pub fn last_good(&self) -> Option<&ScheduleSnapshot> {
        match self {
            ScheduleAxis::Idle => None,
            ScheduleAxis::Loaded(snapshot) => Some(snapshot),
            ScheduleAxis::Loading { last_good, .. } | ScheduleAxis::Failed { last_good, .. } => last_good.as_ref(),
        }
    }

    pub fn status(&self) -> Option<&ScheduleStatus> {
        self.last_good().map(|snapshot| &snapshot.status)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ScheduleAxis::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScheduleAxis::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn take_last_good(&mut self) -> Option<ScheduleSnapshot> {
        match std::mem::take(self) {
            ScheduleAxis::Idle => None,
            ScheduleAxis::Loaded(snapshot) => Some(snapshot),
            ScheduleAxis::Loading { last_good, .. } | ScheduleAxis::Failed { last_good, .. } => last_good,
        }
    }
}

/// What the status badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleIndicator {
    Active,
    Paused,
    Loading,
    Unknown,
}

impl fmt::Display for ScheduleIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleIndicator::Active => "Active",
            ScheduleIndicator::Paused => "Paused",
            ScheduleIndicator::Loading => "Loading...",
            ScheduleIndicator::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunAxis {
    #[default]
    Idle,
    Running {
        token: RequestToken,
    },
    Completed {
        at: DateTime<Utc>,
    },
    Errored {
        message: String,
    },
}

impl RunAxis {
    pub fn is_running(&self) -> bool {
        matches!(self, RunAxis::Running { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Pause,
    Resume,
}

impl ToggleAction {
    /// Pause an active schedule, resume anything else.
    pub fn for_status(status: &ScheduleStatus) -> Self {
        if status.active {
            ToggleAction::Pause
        } else {
            ToggleAction::Resume
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            ToggleAction::Pause => "pause",
            ToggleAction::Resume => "resume",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleInFlight {
    pub token: RequestToken,
    pub action: ToggleAction,
}

/// Everything the views render from. Changed only through the transitions below.
#[derive(Debug)]
pub struct SyncState {
    settings: Settings,
    history: DigestHistory,
    schedule: ScheduleAxis,
    run: RunAxis,
    toggle: Option<ToggleInFlight>,
    notice: Option<String>,
    next_token: u64,
}

impl SyncState {
    pub fn new(settings: Settings, history: DigestHistory) -> Self {
        Self {
            settings,
            history,
            schedule: ScheduleAxis::Idle,
            run: RunAxis::Idle,
            toggle: None,
            notice: None,
            next_token: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &DigestHistory {
        &self.history
    }

    pub fn latest_digest(&self) -> Option<&DigestResult> {
        self.history.latest()
    }

    pub fn schedule(&self) -> &ScheduleAxis {
        &self.schedule
    }

    pub fn run(&self) -> &RunAxis {
        &self.run
    }

    pub fn toggle(&self) -> Option<ToggleInFlight> {
        self.toggle
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn can_toggle(&self) -> bool {
        self.toggle.is_none() && matches!(self.schedule, ScheduleAxis::Loaded(_))
    }

    pub fn can_run(&self) -> bool {
        !self.run.is_running()
    }

    pub fn schedule_indicator(&self) -> ScheduleIndicator {
        match &self.schedule {
            ScheduleAxis::Loaded(snapshot) if snapshot.status.active => ScheduleIndicator::Active,
            ScheduleAxis::Loaded(_) => ScheduleIndicator::Paused,
            ScheduleAxis::Loading { .. } => ScheduleIndicator::Loading,
            ScheduleAxis::Idle | ScheduleAxis::Failed { .. } => ScheduleIndicator::Unknown,
        }
    }

    fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }

    /// Enter `Loading`, superseding any load already in flight.
    pub fn begin_schedule_load(&mut self) -> RequestToken {
        let last_good = self.schedule.take_last_good();
        let token = self.issue_token();
        debug!("Schedule load {:?} started", token);
        self.schedule = ScheduleAxis::Loading { token, last_good };
        token
    }

    /// Apply both halves of a schedule refresh. Returns false if `token` was superseded.
    pub fn finish_schedule_load(
        &mut self,
        token: RequestToken,
        status: Result<ScheduleStatus, GatewayError>,
        log: Result<Vec<ExecutionLogEntry>, GatewayError>,
    ) -> bool {
        if !matches!(self.schedule, ScheduleAxis::Loading { token: current, .. } if current == token) {
            debug!("Discarding superseded schedule response {:?}", token);
            return false;
        }

        let last_good = self.schedule.take_last_good();
        self.schedule = match status {
            Ok(status) => {
                let (log, log_error) = match log {
                    Ok(entries) => (entries, None),
                    Err(e) => {
                        warn!("Execution log fetch failed: {}", e);
                        (last_good.map(|snapshot| snapshot.log).unwrap_or_default(), Some(e.to_string()))
                    }
                };
                info!("Schedule {} loaded (active={})", status.id, status.active);
                ScheduleAxis::Loaded(ScheduleSnapshot {
                    status,
                    log,
                    log_error,
                })
            }
            Err(e) => {
                warn!("Schedule status fetch failed: {}", e);
                ScheduleAxis::Failed {
                    last_good,
                    error: e.to_string(),
                }
            }
        };
        true
    }

    pub fn begin_run(&mut self) -> Result<RequestToken, SyncError> {
        if self.run.is_running() {
            return Err(SyncError::Busy);
        }
        let token = self.issue_token();
        self.run = RunAxis::Running { token };
        Ok(token)
    }

    /// Commit a finished run.
    ///
    /// On success the result becomes `history[0]` (and with it the latest
    /// digest) in one step, and the history to persist is returned.
    pub fn finish_run(
        &mut self,
        token: RequestToken,
        result: Result<DigestResult, InvocationError>,
    ) -> Option<&DigestHistory> {
        if !matches!(self.run, RunAxis::Running { token: current } if current == token) {
            debug!("Discarding superseded run completion {:?}", token);
            return None;
        }

        match result {
            Ok(digest) => {
                let at = digest.execution_time;
                self.history.prepend(digest);
                self.run = RunAxis::Completed { at };
                Some(&self.history)
            }
            Err(e) => {
                warn!("Digest run failed: {}", e);
                self.run = RunAxis::Errored { message: e.to_string() };
                None
            }
        }
    }

    /// Claim the pause/resume control. Only allowed with an authoritative, settled status.
    pub fn begin_toggle(&mut self) -> Result<(RequestToken, ToggleAction), SyncError> {
        if self.toggle.is_some() {
            return Err(SyncError::ToggleUnavailable(
                "a pause/resume request is already in flight".to_string(),
            ));
        }

        let action = match &self.schedule {
            ScheduleAxis::Loaded(snapshot) => ToggleAction::for_status(&snapshot.status),
            ScheduleAxis::Loading { .. } => {
                return Err(SyncError::ToggleUnavailable("schedule is refreshing".to_string()));
            }
            ScheduleAxis::Idle | ScheduleAxis::Failed { .. } => {
                return Err(SyncError::ToggleUnavailable("schedule status is unknown".to_string()));
            }
        };

        let token = self.issue_token();
        self.toggle = Some(ToggleInFlight { token, action });
        Ok((token, action))
    }

    /// Release the pause/resume control. The caller refreshes the schedule afterwards.
    pub fn finish_toggle(&mut self, token: RequestToken, result: Result<(), GatewayError>) -> bool {
        let Some(in_flight) = self.toggle.filter(|in_flight| in_flight.token == token) else {
            debug!("Discarding superseded toggle completion {:?}", token);
            return false;
        };
        self.toggle = None;

        match result {
            Ok(()) => info!("Schedule {} request acknowledged", in_flight.action.verb()),
            Err(e) => {
                warn!("Schedule {} failed: {}", in_flight.action.verb(), e);
                self.notice = Some(format!("Could not {} schedule: {}", in_flight.action.verb(), e));
            }
        }
        true
    }

    pub fn replace_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HISTORY_CAP;
    use chrono::TimeZone;

    fn status(active: bool) -> ScheduleStatus {
        ScheduleStatus {
            id: "sched-1".to_string(),
            active,
            cron_expression: "0 8 * * *".to_string(),
            timezone: "UTC".to_string(),
            next_run_time: Some(Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap()),
            last_run_at: None,
        }
    }

    fn entry(id: &str) -> ExecutionLogEntry {
        ExecutionLogEntry {
            id: id.to_string(),
            executed_at: Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap(),
            success: true,
            output_summary: "ok".to_string(),
        }
    }

    fn digest(included: u32) -> DigestResult {
        DigestResult {
            papers_analyzed: 50,
            papers_included: included,
            top_papers: Vec::new(),
            digest_sent: true,
            recipient_email: "ada@example.org".to_string(),
            execution_time: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
        }
    }

    fn fresh() -> SyncState {
        SyncState::new(Settings::default(), DigestHistory::new())
    }

    fn loaded(active: bool) -> SyncState {
        let mut state = fresh();
        let token = state.begin_schedule_load();
        assert!(state.finish_schedule_load(token, Ok(status(active)), Ok(vec![entry("a")])));
        state
    }

    #[test]
    fn test_schedule_load_success() {
        let state = loaded(true);
        assert_eq!(state.schedule_indicator(), ScheduleIndicator::Active);
        let snapshot = state.schedule().last_good().unwrap();
        assert_eq!(snapshot.log.len(), 1);
        assert!(snapshot.log_error.is_none());
        assert!(state.can_toggle());
    }

    #[test]
    fn test_schedule_load_failure_keeps_last_good() {
        let mut state = loaded(false);
        let token = state.begin_schedule_load();
        assert_eq!(state.schedule_indicator(), ScheduleIndicator::Loading);
        assert!(!state.can_toggle());

        state.finish_schedule_load(token, Err(GatewayError::Timeout), Err(GatewayError::Timeout));
        assert_eq!(state.schedule_indicator(), ScheduleIndicator::Unknown);
        assert_eq!(state.schedule().error(), Some("Request timed out"));
        assert!(!state.schedule().status().unwrap().active);
        assert!(!state.can_toggle());
    }

    #[test]
    fn test_failed_log_keeps_previous_page() {
        let mut state = loaded(true);
        let token = state.begin_schedule_load();
        state.finish_schedule_load(token, Ok(status(false)), Err(GatewayError::Remote("down".to_string())));

        let snapshot = state.schedule().last_good().unwrap();
        assert!(!snapshot.status.active);
        assert_eq!(snapshot.log[0].id, "a");
        assert!(snapshot.log_error.as_deref().unwrap().contains("down"));
    }

    #[test]
    fn test_superseded_schedule_response_is_discarded() {
        let mut state = fresh();
        let stale = state.begin_schedule_load();
        let current = state.begin_schedule_load();

        assert!(!state.finish_schedule_load(stale, Ok(status(false)), Ok(vec![])));
        assert!(state.schedule().is_loading());

        assert!(state.finish_schedule_load(current, Ok(status(true)), Ok(vec![])));
        assert_eq!(state.schedule_indicator(), ScheduleIndicator::Active);

        assert!(!state.finish_schedule_load(stale, Ok(status(false)), Ok(vec![])));
        assert_eq!(state.schedule_indicator(), ScheduleIndicator::Active);
    }

    #[test]
    fn test_run_commits_latest_and_history_together() {
        let mut state = fresh();
        let token = state.begin_run().unwrap();
        assert!(!state.can_run());

        let persisted = state.finish_run(token, Ok(digest(10))).cloned().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(state.latest_digest(), state.history().get(0));
        assert_eq!(state.latest_digest().unwrap().papers_included, 10);
        assert!(matches!(state.run(), RunAxis::Completed { .. }));
        assert!(state.can_run());
    }

    #[test]
    fn test_second_run_is_busy() {
        let mut state = fresh();
        let token = state.begin_run().unwrap();
        assert_eq!(state.begin_run(), Err(SyncError::Busy));

        state.finish_run(token, Ok(digest(3)));
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_failed_run_leaves_history_alone() {
        let mut state = fresh();
        let token = state.begin_run().unwrap();
        let persisted = state.finish_run(token, Err(InvocationError::Malformed("no result".to_string())));
        assert!(persisted.is_none());
        assert!(state.history().is_empty());
        assert!(matches!(state.run(), RunAxis::Errored { message } if message.contains("no result")));
        assert!(state.begin_run().is_ok());
    }

    #[test]
    fn test_history_cap_through_runs() {
        let mut state = fresh();
        for n in 0..(HISTORY_CAP as u32 + 3) {
            let token = state.begin_run().unwrap();
            state.finish_run(token, Ok(digest(n)));
        }
        assert_eq!(state.history().len(), HISTORY_CAP);
        assert_eq!(state.latest_digest().unwrap().papers_included, HISTORY_CAP as u32 + 2);
    }

    #[test]
    fn test_toggle_requires_loaded_status() {
        let mut state = fresh();
        assert!(matches!(state.begin_toggle(), Err(SyncError::ToggleUnavailable(_))));

        state.begin_schedule_load();
        assert!(matches!(state.begin_toggle(), Err(SyncError::ToggleUnavailable(_))));
    }

    #[test]
    fn test_toggle_picks_action_from_status() {
        let (_, action) = loaded(true).begin_toggle().unwrap();
        assert_eq!(action, ToggleAction::Pause);

        let (_, action) = loaded(false).begin_toggle().unwrap();
        assert_eq!(action, ToggleAction::Resume);
    }

    #[test]
    fn test_toggle_is_exclusive_and_does_not_flip_status() {
        let mut state = loaded(true);
        let (token, _) = state.begin_toggle().unwrap();
        assert!(!state.can_toggle());
        assert!(state.begin_toggle().is_err());

        assert!(state.finish_toggle(token, Ok(())));
        assert!(state.toggle().is_none());
        assert!(state.schedule().status().unwrap().active);
    }

    #[test]
    fn test_toggle_failure_sets_notice() {
        let mut state = loaded(true);
        let (token, _) = state.begin_toggle().unwrap();
        state.finish_toggle(token, Err(GatewayError::Timeout));
        assert_eq!(state.notice(), Some("Could not pause schedule: Request timed out"));

        state.clear_notice();
        assert!(state.notice().is_none());
    }
}
