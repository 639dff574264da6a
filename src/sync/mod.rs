//! View-State Synchronizer
//!
//! Owns the one application-state object and reconciles three independent
//! axes into it:
//!
//! - **schedule**: remote status plus the recent execution log, refreshed on
//!   screen entry and after every pause/resume
//! - **run**: the on-demand digest invocation, at most one in flight
//! - **countdown**: derived from the loaded `next_run_time`, never committed
//!
//! Network work runs in spawned tasks. Each task reports back with the
//! `RequestToken` it was started under, and `Synchronizer::apply` is the only
//! place completions touch state. A completion whose token was superseded is
//! dropped.

mod countdown;
mod state;
mod synchronizer;

pub use countdown::{Countdown, CountdownTimer, countdown};
pub use state::{
    RequestToken, RunAxis, ScheduleAxis, ScheduleIndicator, ScheduleSnapshot, SyncState, ToggleAction, ToggleInFlight,
};
pub use synchronizer::{SyncEvent, Synchronizer};

/// Actions the synchronizer refuses to start
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("A digest run is already in progress")]
    Busy,

    #[error("Pause/resume unavailable: {0}")]
    ToggleUnavailable(String),
}
