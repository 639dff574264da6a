//! Terminal input for the TUI loop.
//!
//! Input is polled with a timeout of one tick, so the loop wakes up at
//! least that often to apply finished network work and redraw the countdown.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use eyre::Result;
use std::time::Duration;

/// What woke the loop up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key press (repeats and releases are folded into `Tick`)
    Key(KeyEvent),
    /// Nothing arrived within the tick, or the input is irrelevant
    Tick,
    Resize(u16, u16),
}

impl From<CrosstermEvent> for Event {
    fn from(raw: CrosstermEvent) -> Self {
        match raw {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
            _ => Event::Tick,
        }
    }
}

/// Polls crossterm off the runtime threads.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Wait at most one tick for input.
    pub async fn next(&self) -> Result<Event> {
        let timeout = self.tick_rate;
        let polled = tokio::task::spawn_blocking(move || -> Result<Option<CrosstermEvent>> {
            Ok(if event::poll(timeout)? { Some(event::read()?) } else { None })
        })
        .await??;

        Ok(polled.map(Event::from).unwrap_or(Event::Tick))
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(250)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent {
            code: KeyCode::Char('r'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_only_presses_become_keys() {
        assert!(matches!(Event::from(key(KeyEventKind::Press)), Event::Key(_)));
        assert_eq!(Event::from(key(KeyEventKind::Release)), Event::Tick);
        assert_eq!(Event::from(key(KeyEventKind::Repeat)), Event::Tick);
    }

    #[test]
    fn test_resize_and_other_input() {
        assert_eq!(Event::from(CrosstermEvent::Resize(120, 40)), Event::Resize(120, 40));
        assert_eq!(Event::from(CrosstermEvent::FocusGained), Event::Tick);
    }

    #[test]
    fn test_tick_rate() {
        assert_eq!(EventHandler::new(100).tick_rate(), Duration::from_millis(100));
        assert_eq!(EventHandler::default().tick_rate(), Duration::from_millis(250));
        assert_eq!(EventHandler::new(0).tick_rate(), Duration::from_millis(1));
    }
}
