//! Countdown to the next scheduled run.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_secs(1);

/// What the countdown shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    NotScheduled,
    RunningSoon,
    Remaining { hours: u64, minutes: u64, seconds: u64 },
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::NotScheduled => write!(f, "Not scheduled"),
            Countdown::RunningSoon => write!(f, "Running soon..."),
            Countdown::Remaining {
                hours,
                minutes,
                seconds,
            } => write!(f, "{}h {}m {}s", hours, minutes, seconds),
        }
    }
}

/// Derive the countdown from the next run time. Pure; units are truncated.
pub fn countdown(next_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Countdown {
    let Some(target) = next_run else {
        return Countdown::NotScheduled;
    };

    let remaining = target - now;
    if remaining <= TimeDelta::zero() {
        return Countdown::RunningSoon;
    }

    let total = remaining.num_seconds().unsigned_abs();
    Countdown::Remaining {
        hours: total / 3600,
        minutes: (total % 3600) / 60,
        seconds: total % 60,
    }
}

/// A once-a-second task publishing the countdown on a watch channel.
///
/// The view that shows the countdown owns the timer. Retargeting to `None`,
/// calling `stop`, or dropping the timer aborts the task.
pub struct CountdownTimer {
    target: Option<DateTime<Utc>>,
    handle: Option<JoinHandle<()>>,
    tx: watch::Sender<Countdown>,
    rx: watch::Receiver<Countdown>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(Countdown::NotScheduled);
        Self {
            target: None,
            handle: None,
            tx,
            rx,
        }
    }

    /// Point the timer at a new target, restarting the task if it changed.
    ///
    /// Must be called from within a tokio runtime when `target` is `Some`.
    pub fn retarget(&mut self, target: Option<DateTime<Utc>>) {
        if self.target == target && (self.handle.is_some() || target.is_none()) {
            return;
        }

        self.stop();
        self.target = target;
        self.tx.send_replace(countdown(target, Utc::now()));

        let Some(target) = target else {
            return;
        };

        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(countdown(Some(target), Utc::now())).is_err() {
                    break;
                }
            }
        }));
    }

    /// Abort the ticking task. The last published value stays readable.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.target = None;
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn current(&self) -> Countdown {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.rx.clone()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
