//! Terminal User Interface for Paperboy.
//!
//! Three screens over the synchronizer's state:
//! - **Dashboard**: schedule status, countdown, run control, recent executions
//! - **Settings**: email, categories, paper limit, summary depth
//! - **History**: past digests with search and expansion
//!
//! The TUI runs on the tokio runtime; network work is spawned by the
//! synchronizer and picked up on every loop iteration.

mod app;
mod events;
#[cfg(test)]
mod fixtures;
mod input;
mod runner;
mod views;

pub use app::{App, HistoryBrowser, SAVED_FLASH, Screen, SettingsForm};
pub use events::{Event, EventHandler};
pub use input::TextInput;
pub use runner::TuiRunner;
pub use views::{DashboardView, HistoryView, SettingsView, View, render};

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use eyre::Result;
use ratatui::prelude::*;
use std::io::{Stdout, stdout};

/// Type alias for our terminal backend.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enable raw mode and switch to the alternate screen.
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Disable raw mode and leave the alternate screen.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

pub mod colors {
    use ratatui::style::Color;

    pub const ACTIVE: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const PAUSED: Color = Color::Rgb(255, 215, 0); // Gold
    pub const FAILED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255);
    pub const DIM: Color = Color::DarkGray;
}
