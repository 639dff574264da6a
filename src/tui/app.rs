//! TUI Application
//!
//! Screen navigation, per-screen interaction state and key handling on top
//! of the `Synchronizer`. Nothing here talks to the network directly.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use super::input::{TextInput, is_force_quit, is_quit};
use crate::domain::{Category, DigestResult, Settings, SettingsField, ValidationError};
use crate::sync::{Countdown, CountdownTimer, Synchronizer};

/// How long the "Settings Saved" confirmation stays up
pub const SAVED_FLASH: Duration = Duration::from_secs(2);

/// Navigable screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Dashboard,
    Settings,
    History,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Dashboard, Screen::Settings, Screen::History];

    pub fn next(self) -> Self {
        match self {
            Self::Dashboard => Self::Settings,
            Self::Settings => Self::History,
            Self::History => Self::Dashboard,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Dashboard => Self::History,
            Self::Settings => Self::Dashboard,
            Self::History => Self::Settings,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Settings => "Settings",
            Self::History => "History",
        }
    }
}

const FIELD_ORDER: [SettingsField; 4] = [
    SettingsField::Email,
    SettingsField::Categories,
    SettingsField::PaperLimit,
    SettingsField::SummaryDepth,
];

/// Draft state of the settings form
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub draft: Settings,
    pub field: SettingsField,
    pub category_cursor: usize,
    pub email: TextInput,
    pub editing_email: bool,
    pub errors: Option<ValidationError>,
    pub saved_at: Option<Instant>,
}

impl SettingsForm {
    fn from_saved(settings: &Settings) -> Self {
        Self {
            draft: settings.clone(),
            field: SettingsField::Email,
            category_cursor: 0,
            email: TextInput::with_content(&settings.email),
            editing_email: false,
            errors: None,
            saved_at: None,
        }
    }

    pub fn cursor_category(&self) -> Category {
        Category::ALL[self.category_cursor.min(Category::ALL.len() - 1)]
    }

    pub fn saved_flash_visible(&self, now: Instant) -> bool {
        self.saved_at.is_some_and(|at| now.duration_since(at) < SAVED_FLASH)
    }

    fn step_field(&mut self, forward: bool) {
        let idx = FIELD_ORDER.iter().position(|f| *f == self.field).unwrap_or(0);
        let len = FIELD_ORDER.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.field = FIELD_ORDER[next];
    }

    fn move_horizontal(&mut self, delta: i64) {
        match self.field {
            SettingsField::Categories => {
                let len = Category::ALL.len() as i64;
                self.category_cursor = (self.category_cursor as i64 + delta).rem_euclid(len) as usize;
            }
            SettingsField::PaperLimit => self.draft.step_paper_limit(delta),
            SettingsField::SummaryDepth => self.draft.summary_depth = self.draft.summary_depth.toggled(),
            SettingsField::Email => {}
        }
    }

    fn activate(&mut self) {
        match self.field {
            SettingsField::Email => self.editing_email = true,
            SettingsField::Categories => {
                let category = self.cursor_category();
                self.draft.toggle_category(category);
            }
            SettingsField::PaperLimit => {}
            SettingsField::SummaryDepth => self.draft.summary_depth = self.draft.summary_depth.toggled(),
        }
    }
}

/// Search, selection and expansion state of the history screen
#[derive(Debug, Clone, Default)]
pub struct HistoryBrowser {
    pub search: TextInput,
    pub searching: bool,
    /// Position within the filtered list
    pub selected: usize,
    /// Keyed by execution time so prepends do not shift expansion
    pub expanded: HashSet<DateTime<Utc>>,
    pub show_why: HashSet<DateTime<Utc>>,
}

impl HistoryBrowser {
    pub fn is_expanded(&self, digest: &DigestResult) -> bool {
        self.expanded.contains(&digest.execution_time)
    }

    pub fn shows_why(&self, digest: &DigestResult) -> bool {
        self.show_why.contains(&digest.execution_time)
    }
}

fn toggle_member(set: &mut HashSet<DateTime<Utc>>, key: DateTime<Utc>) {
    if !set.remove(&key) {
        set.insert(key);
    }
}

/// Main TUI application
pub struct App {
    sync: Synchronizer,
    screen: Screen,
    countdown: CountdownTimer,
    pub settings_form: SettingsForm,
    pub history: HistoryBrowser,
    pub preview_expanded: bool,
    status_message: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(sync: Synchronizer) -> Self {
        let settings_form = SettingsForm::from_saved(sync.state().settings());
        Self {
            sync,
            screen: Screen::Dashboard,
            countdown: CountdownTimer::new(),
            settings_form,
            history: HistoryBrowser::default(),
            preview_expanded: false,
            status_message: None,
            should_quit: false,
        }
    }

    /// Mount the initial screen. Needs a tokio runtime.
    pub fn start(&mut self) {
        self.enter(self.screen);
    }

    pub fn sync(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut Synchronizer {
        &mut self.sync
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown.current()
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Switch screens, tearing down what the old one owned.
    pub fn set_screen(&mut self, screen: Screen) {
        if screen == self.screen {
            return;
        }
        if self.screen == Screen::Dashboard {
            self.countdown.stop();
        }
        self.screen = screen;
        self.enter(screen);
    }

    fn enter(&mut self, screen: Screen) {
        debug!("Entering {} screen", screen.name());
        match screen {
            Screen::Dashboard => {
                self.sync.refresh_schedule();
                self.countdown.retarget(self.sync.next_run_time());
            }
            Screen::Settings => {
                self.settings_form = SettingsForm::from_saved(self.sync.state().settings());
            }
            Screen::History => {
                self.history.selected = 0;
            }
        }
    }

    /// Apply finished work and keep derived state current. Called after every event.
    pub fn on_tick(&mut self) {
        self.sync.drain();

        if self.screen == Screen::Dashboard {
            self.countdown.retarget(self.sync.next_run_time());
        }

        if self
            .settings_form
            .saved_at
            .is_some_and(|at| at.elapsed() >= SAVED_FLASH)
        {
            self.settings_form.saved_at = None;
        }

        let visible = self.visible_history().len();
        if self.history.selected >= visible {
            self.history.selected = visible.saturating_sub(1);
        }
    }

    /// History indices that match the current search, newest first.
    pub fn visible_history(&self) -> Vec<usize> {
        self.sync.state().history().search(self.history.search.content())
    }

    pub fn selected_digest(&self) -> Option<&DigestResult> {
        let visible = self.visible_history();
        let idx = *visible.get(self.history.selected)?;
        self.sync.state().history().get(idx)
    }

    /// Handle a key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if is_force_quit(&key) {
            self.should_quit = true;
            return true;
        }

        if self.is_typing() {
            match self.screen {
                Screen::Settings => self.handle_email_key(key),
                Screen::History => self.handle_search_key(key),
                Screen::Dashboard => {}
            }
            return false;
        }

        if is_quit(&key) {
            self.should_quit = true;
            return true;
        }

        match key.code {
            KeyCode::Char('1') => self.set_screen(Screen::Dashboard),
            KeyCode::Char('2') => self.set_screen(Screen::Settings),
            KeyCode::Char('3') => self.set_screen(Screen::History),
            KeyCode::Tab => self.set_screen(self.screen.next()),
            KeyCode::BackTab => self.set_screen(self.screen.prev()),
            _ => match self.screen {
                Screen::Dashboard => self.handle_dashboard_key(key),
                Screen::Settings => self.handle_settings_key(key),
                Screen::History => self.handle_history_key(key),
            },
        }
        false
    }

    fn is_typing(&self) -> bool {
        match self.screen {
            Screen::Settings => self.settings_form.editing_email,
            Screen::History => self.history.searching,
            Screen::Dashboard => false,
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => match self.sync.run_now() {
                Ok(_) => self.set_status("Digest run started"),
                Err(e) => self.set_status(e.to_string()),
            },
            KeyCode::Char('p') => match self.sync.toggle_schedule() {
                Ok(action) => self.set_status(format!("Requested schedule {}", action.verb())),
                Err(e) => self.set_status(e.to_string()),
            },
            KeyCode::Char('f') => {
                self.sync.refresh_schedule();
            }
            KeyCode::Char('e') => self.preview_expanded = !self.preview_expanded,
            KeyCode::Esc => {
                self.clear_status();
                self.sync.dismiss_notice();
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let form = &mut self.settings_form;
        match key.code {
            KeyCode::Up => form.step_field(false),
            KeyCode::Down => form.step_field(true),
            KeyCode::Left | KeyCode::Char('-') => form.move_horizontal(-1),
            KeyCode::Right | KeyCode::Char('+') => form.move_horizontal(1),
            KeyCode::Enter | KeyCode::Char(' ') => form.activate(),
            KeyCode::Char('s') => self.save_settings(),
            _ => {}
        }
    }

    fn handle_email_key(&mut self, key: KeyEvent) {
        let form = &mut self.settings_form;
        match key.code {
            KeyCode::Enter => {
                form.draft.email = form.email.content().trim().to_string();
                form.editing_email = false;
            }
            KeyCode::Esc => {
                form.email.set(&form.draft.email);
                form.editing_email = false;
            }
            _ => {
                form.email.handle_key(&key);
            }
        }
    }

    /// Validate and save the draft. Invalid drafts stay on screen with inline errors.
    pub fn save_settings(&mut self) {
        let draft = self.settings_form.draft.clone();
        match self.sync.save_settings(draft) {
            Ok(()) => {
                self.settings_form.errors = None;
                self.settings_form.saved_at = Some(Instant::now());
            }
            Err(errors) => {
                self.settings_form.saved_at = None;
                self.settings_form.errors = Some(errors);
            }
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('/') => self.history.searching = true,
            KeyCode::Up => self.history.selected = self.history.selected.saturating_sub(1),
            KeyCode::Down => {
                let visible = self.visible_history().len();
                if self.history.selected + 1 < visible {
                    self.history.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(key) = self.selected_digest().map(|d| d.execution_time) {
                    toggle_member(&mut self.history.expanded, key);
                }
            }
            KeyCode::Char('w') => {
                if let Some(key) = self.selected_digest().map(|d| d.execution_time) {
                    self.history.expanded.insert(key);
                    toggle_member(&mut self.history.show_why, key);
                }
            }
            KeyCode::Esc => self.history.search.clear(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.history.searching = false,
            KeyCode::Esc => {
                self.history.search.clear();
                self.history.searching = false;
            }
            _ => {
                self.history.search.handle_key(&key);
            }
        }
        self.history.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::fixtures::{Harness, digest};
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_screen_cycle() {
        assert_eq!(Screen::Dashboard.next(), Screen::Settings);
        assert_eq!(Screen::Dashboard.next().next().next(), Screen::Dashboard);
        assert_eq!(Screen::Dashboard.prev(), Screen::History);
        assert_eq!(Screen::History.name(), "History");
    }

    #[tokio::test]
    async fn test_quit_key() {
        let harness = Harness::new();
        let mut app = harness.app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_entering_dashboard_refreshes_and_leaving_stops_countdown() {
        let harness = Harness::new();
        let mut app = harness.app();
        app.start();
        app.sync_mut().settle().await;
        app.on_tick();

        assert_eq!(harness.gateway.status_calls(), 1);
        assert!(app.countdown_running());

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.screen(), Screen::Settings);
        assert!(!app.countdown_running());

        press(&mut app, KeyCode::Char('1'));
        app.sync_mut().settle().await;
        assert_eq!(harness.gateway.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_settings_edit_and_save() {
        let harness = Harness::new();
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "ada@example.org");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.settings_form.draft.email, "ada@example.org");

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.settings_form.draft.categories.contains(&Category::ComputerVision));

        press(&mut app, KeyCode::Down);
        for _ in 0..40 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.settings_form.draft.paper_limit, 25);

        press(&mut app, KeyCode::Char('s'));
        assert!(app.settings_form.errors.is_none());
        assert!(app.settings_form.saved_flash_visible(Instant::now()));
        assert_eq!(app.sync().state().settings().paper_limit, 25);
        assert_eq!(harness.store().load().email, "ada@example.org");
    }

    #[tokio::test]
    async fn test_invalid_settings_show_inline_errors() {
        let harness = Harness::new();
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('s'));
        let errors = app.settings_form.errors.clone().unwrap();
        assert!(errors.message_for(SettingsField::Email).is_some());
        assert!(!app.settings_form.saved_flash_visible(Instant::now()));
        assert_eq!(harness.store().load(), Settings::default());
    }

    #[tokio::test]
    async fn test_quit_key_is_text_while_typing() {
        let harness = Harness::new();
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);

        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.settings_form.email.content(), "q");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.settings_form.draft.email, "");
        assert!(!app.settings_form.editing_email);
    }

    #[tokio::test]
    async fn test_history_search_and_expand() {
        let harness = Harness::with_history(vec![digest(3, "ada@example.org"), digest(5, "grace@example.org")]);
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.visible_history().len(), 2);

        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "GRACE");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.visible_history(), vec![1]);

        press(&mut app, KeyCode::Enter);
        let selected = app.selected_digest().unwrap().clone();
        assert_eq!(selected.recipient_email, "grace@example.org");
        assert!(app.history.is_expanded(&selected));

        press(&mut app, KeyCode::Char('w'));
        assert!(app.history.shows_why(&selected));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_history().len(), 2);
    }

    #[tokio::test]
    async fn test_run_now_twice_reports_busy() {
        let harness = Harness::gated();
        let mut app = harness.app();

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.status_message(), Some("Digest run started"));
        assert!(!app.sync().can_run());

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.status_message(), Some("A digest run is already in progress"));

        harness.release_agent();
        app.sync_mut().settle().await;
        assert_eq!(app.sync().state().history().len(), 1);
        assert_eq!(harness.agent.calls(), 1);
    }

    #[tokio::test]
    async fn test_toggle_without_status_is_refused() {
        let harness = Harness::new();
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('p'));
        assert!(app.status_message().unwrap().contains("unavailable"));
        assert_eq!(harness.gateway.pause_calls(), 0);
    }
}
