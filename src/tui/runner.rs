//! TUI Runner - main event loop.
//!
//! The `TuiRunner` owns the terminal, app, and event handler. It runs the
//! main loop: render → wait for a key or tick → apply completions → repeat.

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views::render;
use eyre::Result;
use log::{debug, info};

/// Main TUI runner that owns the event loop.
pub struct TuiRunner {
    terminal: Tui,
    app: App,
    event_handler: EventHandler,
}

impl TuiRunner {
    pub fn new(terminal: Tui, app: App, tick_rate_ms: u64) -> Self {
        Self {
            terminal,
            app,
            event_handler: EventHandler::new(tick_rate_ms),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Run until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting TUI main loop");
        self.app.start();

        loop {
            self.terminal.draw(|f| render(&self.app, f))?;

            match self.event_handler.next().await? {
                Event::Key(key) => {
                    if self.app.handle_key(key) {
                        break;
                    }
                }
                Event::Tick => {}
                Event::Resize(w, h) => debug!("Resized to {}x{}", w, h),
            }

            self.app.on_tick();

            if self.app.should_quit() {
                break;
            }
        }

        let pending = self.app.sync().pending();
        if pending > 0 {
            info!("Leaving with {} request(s) still in flight", pending);
        }
        info!("TUI main loop ended");
        Ok(())
    }
}
