//! TUI Views
//!
//! Rendering for the Dashboard, Settings and History screens plus the
//! shared chrome (tab bar, sidebar, footer). Views only read from `App`.

use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use super::app::{App, Screen};
use super::colors;
use crate::domain::{Category, DigestResult, ExecutionLogEntry, PAPER_LIMIT_MAX, PAPER_LIMIT_MIN, SettingsField, SummaryDepth};
use crate::gateway::humanize_cron;
use crate::sync::{RunAxis, ScheduleIndicator};

/// Papers shown in the dashboard preview
const PREVIEW_PAPERS: usize = 3;

/// Trait for renderable views
pub trait View {
    /// Render the view to the frame
    fn render(&self, frame: &mut Frame, area: Rect, app: &App);

    /// Get the view title
    fn title(&self) -> &'static str;
}

/// Render the whole screen.
pub fn render(app: &App, frame: &mut Frame) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    render_tabs(frame, rows[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(rows[1]);

    render_sidebar(frame, body[0], app);

    let view: &dyn View = match app.screen() {
        Screen::Dashboard => &DashboardView,
        Screen::Settings => &SettingsView,
        Screen::History => &HistoryView,
    };
    view.render(frame, body[1], app);

    render_footer(frame, rows[2], app);
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %-d, %Y %-I:%M %p").to_string()
}

fn dim() -> Style {
    Style::default().fg(colors::DIM)
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<11}", text), Style::default().fg(colors::HEADER))
}

fn keybind(key: &str, action: &str, enabled: bool) -> Vec<Span<'static>> {
    let (key_style, text_style) = if enabled {
        (Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD), Style::default())
    } else {
        (dim(), dim())
    };
    vec![
        Span::styled(format!("[{}]", key), key_style),
        Span::styled(format!(" {}  ", action), text_style),
    ]
}

fn indicator_style(indicator: ScheduleIndicator) -> Style {
    let color = match indicator {
        ScheduleIndicator::Active => colors::ACTIVE,
        ScheduleIndicator::Paused => colors::PAUSED,
        ScheduleIndicator::Loading => colors::DIM,
        ScheduleIndicator::Unknown => colors::FAILED,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " paperboy ",
        Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
    )];
    for (idx, screen) in Screen::ALL.iter().enumerate() {
        let style = if *screen == app.screen() {
            Style::default().fg(colors::KEYBIND).add_modifier(Modifier::REVERSED)
        } else {
            dim()
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} {} ", idx + 1, screen.name()), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(6)])
        .split(area);

    let items: Vec<ListItem> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(idx, screen)| {
            let selected = *screen == app.screen();
            let marker = if selected { "▶" } else { " " };
            let style = if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(format!("{} {}  {}", marker, idx + 1, screen.name()))).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" arXiv Digest ")),
        chunks[0],
    );

    let sync = app.sync();
    let indicator = sync.schedule_indicator();
    let mut lines = vec![Line::from(vec![
        Span::styled("● ", indicator_style(indicator)),
        Span::styled(indicator.to_string(), indicator_style(indicator)),
    ])];
    match sync.state().schedule().status() {
        Some(status) => {
            lines.push(Line::from(humanize_cron(&status.cron_expression)));
            lines.push(Line::styled(status.timezone.clone(), dim()));
        }
        None => lines.push(Line::styled("Schedule unknown", dim())),
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Schedule ")),
        chunks[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(notice) = app.sync().state().notice() {
        Line::styled(format!(" {}  (Esc to dismiss)", notice), Style::default().fg(colors::FAILED))
    } else if let Some(message) = app.status_message() {
        Line::styled(format!(" {}", message), Style::default().fg(colors::PAUSED))
    } else {
        let hints = match app.screen() {
            Screen::Dashboard => " r run  p pause/resume  f refresh  e expand  Tab switch  q quit",
            Screen::Settings => " ↑/↓ field  ←/→ adjust  Space toggle  Enter edit email  s save  q quit",
            Screen::History => " / search  ↑/↓ select  Enter expand  w why this matters  q quit",
        };
        Line::styled(hints, dim())
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Schedule status, run control, recent executions and the latest digest
pub struct DashboardView;

impl DashboardView {
    fn status_lines(app: &App) -> Vec<Line<'static>> {
        let sync = app.sync();
        let state = sync.state();
        let indicator = sync.schedule_indicator();

        let mut lines = vec![
            Line::from(vec![
                label("Status"),
                Span::styled(indicator.to_string(), indicator_style(indicator)),
            ]),
            Line::from(vec![label("Next run"), Span::raw(app.countdown().to_string())]),
        ];

        let status = state.schedule().status();
        let last_run = status
            .and_then(|s| s.last_run_at.as_ref())
            .map(format_timestamp)
            .unwrap_or_else(|| "Never".to_string());
        lines.push(Line::from(vec![label("Last run"), Span::raw(last_run)]));

        if let Some(status) = status {
            lines.push(Line::from(vec![
                label("Schedule"),
                Span::raw(format!("{} ({})", humanize_cron(&status.cron_expression), status.timezone)),
            ]));
        }

        if let Some(error) = state.schedule().error() {
            lines.push(Line::styled(
                format!("Status unavailable: {}", error),
                Style::default().fg(colors::FAILED),
            ));
        }
        lines
    }

    fn run_lines(app: &App) -> Vec<Line<'static>> {
        let sync = app.sync();
        let run = match sync.state().run() {
            RunAxis::Idle => Span::raw("Ready"),
            RunAxis::Running { .. } => Span::styled("Running digest...", Style::default().fg(colors::PAUSED)),
            RunAxis::Completed { at } => Span::styled(
                format!("Completed {}", format_timestamp(at)),
                Style::default().fg(colors::ACTIVE),
            ),
            RunAxis::Errored { message } => {
                Span::styled(format!("Failed: {}", message), Style::default().fg(colors::FAILED))
            }
        };

        let toggle_label = match sync.state().schedule().status() {
            Some(status) if status.active => "Pause",
            Some(_) => "Resume",
            None => "Pause/Resume",
        };

        let mut controls = keybind("r", "Run Now", sync.can_run());
        controls.extend(keybind("p", toggle_label, sync.can_toggle()));
        controls.extend(keybind("f", "Refresh", !sync.state().schedule().is_loading()));

        vec![Line::from(vec![label("Run"), run]), Line::default(), Line::from(controls)]
    }

    fn execution_item(entry: &ExecutionLogEntry) -> ListItem<'static> {
        let badge = if entry.success {
            Span::styled("[Success]", Style::default().fg(colors::ACTIVE))
        } else {
            Span::styled("[Failed] ", Style::default().fg(colors::FAILED))
        };
        ListItem::new(Line::from(vec![
            Span::raw(format!("{}  ", format_timestamp(&entry.executed_at))),
            badge,
            Span::raw(format!("  {}", entry.output_summary)),
        ]))
    }

    fn preview_lines(digest: &DigestResult, expanded: bool) -> Vec<Line<'static>> {
        let sent = if digest.digest_sent { "sent" } else { "not sent" };
        let mut lines = vec![
            Line::from(format!(
                "{} papers analyzed, {} included, {} to {}",
                digest.papers_analyzed, digest.papers_included, sent, digest.recipient_email
            )),
            Line::styled(format_timestamp(&digest.execution_time), dim()),
            Line::default(),
        ];
        for (idx, paper) in digest.top_papers.iter().take(PREVIEW_PAPERS).enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", idx + 1), Style::default().fg(colors::HEADER)),
                Span::styled(paper.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
            lines.push(Line::styled(format!("   {} | {}", paper.authors, paper.category), dim()));
            if expanded {
                lines.push(Line::from(format!("   {}", paper.summary)));
            }
        }
        lines
    }
}

impl View for DashboardView {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Length(7), Constraint::Min(5)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        frame.render_widget(
            Paragraph::new(Self::status_lines(app))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Schedule Status ")),
            top[0],
        );
        frame.render_widget(
            Paragraph::new(Self::run_lines(app))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Digest ")),
            top[1],
        );

        let schedule = app.sync().state().schedule();
        let mut log_title = " Recent Executions ".to_string();
        if schedule.last_good().is_some_and(|s| s.log_error.is_some()) {
            log_title = " Recent Executions (stale) ".to_string();
        }
        let log_block = Block::default().borders(Borders::ALL).title(log_title);
        match schedule.last_good() {
            Some(snapshot) if !snapshot.log.is_empty() => {
                let items: Vec<ListItem> = snapshot.log.iter().map(Self::execution_item).collect();
                frame.render_widget(List::new(items).block(log_block), rows[1]);
            }
            _ => frame.render_widget(Paragraph::new("No executions yet").style(dim()).block(log_block), rows[1]),
        }

        let toggle_hint = if app.preview_expanded { "e collapse" } else { "e expand" };
        let preview_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Latest Digest ({}) ", toggle_hint));
        let preview = match app.sync().state().latest_digest() {
            Some(digest) => Paragraph::new(Self::preview_lines(digest, app.preview_expanded)),
            None => Paragraph::new("No digests yet. Press r to run one.").style(dim()),
        };
        frame.render_widget(preview.wrap(Wrap { trim: false }).block(preview_block), rows[2]);
    }

    fn title(&self) -> &'static str {
        "Dashboard"
    }
}

/// Digest preferences form
pub struct SettingsView;

impl SettingsView {
    fn field_label(form_field: SettingsField, current: SettingsField, text: &str) -> Span<'static> {
        let focused = form_field == current;
        let marker = if focused { "▶ " } else { "  " };
        let style = if focused {
            Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::HEADER)
        };
        Span::styled(format!("{}{:<14}", marker, text), style)
    }

    fn error_line(app: &App, field: SettingsField) -> Option<Line<'static>> {
        let message = app.settings_form.errors.as_ref()?.message_for(field)?;
        Some(Line::styled(
            format!("                  ! {}", message),
            Style::default().fg(colors::FAILED),
        ))
    }

    fn lines(app: &App) -> Vec<Line<'static>> {
        let form = &app.settings_form;
        let mut lines = Vec::new();

        let email = if form.editing_email {
            let (before, after) = form.email.content().split_at(form.email.cursor());
            Line::from(vec![
                Self::field_label(SettingsField::Email, form.field, "Email"),
                Span::raw(before.to_string()),
                Span::styled("▏", Style::default().fg(colors::KEYBIND)),
                Span::raw(after.to_string()),
            ])
        } else if form.draft.email.is_empty() {
            Line::from(vec![
                Self::field_label(SettingsField::Email, form.field, "Email"),
                Span::styled("(not set, Enter to edit)", dim()),
            ])
        } else {
            Line::from(vec![
                Self::field_label(SettingsField::Email, form.field, "Email"),
                Span::raw(form.draft.email.clone()),
            ])
        };
        lines.push(email);
        lines.extend(Self::error_line(app, SettingsField::Email));
        lines.push(Line::default());

        lines.push(Line::from(Self::field_label(SettingsField::Categories, form.field, "Categories")));
        for (idx, category) in Category::ALL.iter().enumerate() {
            let checked = if form.draft.categories.contains(category) { "[x]" } else { "[ ]" };
            let cursor = form.field == SettingsField::Categories && idx == form.category_cursor;
            let style = if cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(format!("{} {} ({})", checked, category.label(), category.code()), style),
            ]));
        }
        lines.extend(Self::error_line(app, SettingsField::Categories));
        lines.push(Line::default());

        lines.push(Line::from(vec![
            Self::field_label(SettingsField::PaperLimit, form.field, "Paper limit"),
            Span::raw(format!("◀ {} ▶", form.draft.paper_limit)),
            Span::styled(format!("  ({}-{})", PAPER_LIMIT_MIN, PAPER_LIMIT_MAX), dim()),
        ]));
        lines.extend(Self::error_line(app, SettingsField::PaperLimit));

        let depth = |value: SummaryDepth, text: &str| {
            let mark = if form.draft.summary_depth == value { "(•)" } else { "( )" };
            format!("{} {}  ", mark, text)
        };
        lines.push(Line::from(vec![
            Self::field_label(SettingsField::SummaryDepth, form.field, "Summary"),
            Span::raw(depth(SummaryDepth::Brief, "Brief")),
            Span::raw(depth(SummaryDepth::Detailed, "Detailed")),
        ]));
        lines.push(Line::default());

        let mut save = keybind("s", "Save", true);
        if form.saved_flash_visible(Instant::now()) {
            save.push(Span::styled("✓ Settings Saved", Style::default().fg(colors::ACTIVE)));
        } else if form.draft != *app.sync().state().settings() {
            save.push(Span::styled("unsaved changes", Style::default().fg(colors::PAUSED)));
        }
        lines.push(Line::from(save));
        lines
    }
}

impl View for SettingsView {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        frame.render_widget(
            Paragraph::new(Self::lines(app)).block(Block::default().borders(Borders::ALL).title(" Settings ")),
            area,
        );
    }

    fn title(&self) -> &'static str {
        "Settings"
    }
}

/// Past digests with search and per-digest expansion
pub struct HistoryView;

impl HistoryView {
    fn digest_lines(app: &App, digest: &DigestResult, selected: bool) -> Vec<Line<'static>> {
        let expanded = app.history.is_expanded(digest);
        let marker = match (selected, expanded) {
            (true, true) => "▼ ",
            (true, false) => "▶ ",
            (false, true) => "▽ ",
            (false, false) => "  ",
        };
        let style = if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let sent = if digest.digest_sent {
            Span::styled("[Sent]", Style::default().fg(colors::ACTIVE))
        } else {
            Span::styled("[Not sent]", Style::default().fg(colors::FAILED))
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!(
                    "{}{}  {}/{} papers  to {}  ",
                    marker,
                    format_timestamp(&digest.execution_time),
                    digest.papers_included,
                    digest.papers_analyzed,
                    digest.recipient_email
                ),
                style,
            ),
            sent,
        ])];

        if !expanded {
            return lines;
        }

        let why = app.history.shows_why(digest);
        for paper in &digest.top_papers {
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(paper.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
            lines.push(Line::styled(format!("      {} | {}", paper.authors, paper.category), dim()));
            lines.push(Line::from(format!("      {}", paper.summary)));
            if why {
                lines.push(Line::from(vec![
                    Span::styled("      Why this matters: ", Style::default().fg(colors::HEADER)),
                    Span::raw(paper.significance.clone()),
                ]));
                lines.push(Line::styled(format!("      {}", paper.abs_url()), dim()));
            }
        }
        lines
    }
}

impl View for HistoryView {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let search = &app.history.search;
        let search_line = if app.history.searching {
            let (before, after) = search.content().split_at(search.cursor());
            Line::from(vec![
                Span::raw(before.to_string()),
                Span::styled("▏", Style::default().fg(colors::KEYBIND)),
                Span::raw(after.to_string()),
            ])
        } else if search.is_empty() {
            Line::styled("Press / to search by email, title or author", dim())
        } else {
            Line::from(search.content().to_string())
        };
        frame.render_widget(
            Paragraph::new(search_line).block(Block::default().borders(Borders::ALL).title(" Search ")),
            rows[0],
        );

        let history = app.sync().state().history();
        let visible = app.visible_history();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" History ({}/{}) ", visible.len(), history.len()));

        if visible.is_empty() {
            let message = if history.is_empty() {
                "No digests yet".to_string()
            } else {
                format!("No digests match \"{}\"", search.content())
            };
            frame.render_widget(Paragraph::new(message).style(dim()).block(block), rows[1]);
            return;
        }

        let mut lines = Vec::new();
        let mut selected_line = 0;
        for (pos, idx) in visible.iter().enumerate() {
            let Some(digest) = history.get(*idx) else {
                continue;
            };
            let selected = pos == app.history.selected;
            if selected {
                selected_line = lines.len();
            }
            lines.extend(Self::digest_lines(app, digest, selected));
        }

        let inner_height = rows[1].height.saturating_sub(2) as usize;
        let scroll = selected_line.saturating_sub(inner_height / 2);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
                .block(block),
            rows[1],
        );
    }

    fn title(&self) -> &'static str {
        "History"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::fixtures::{Harness, digest};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| render(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_view_titles() {
        let views: [&dyn View; 3] = [&DashboardView, &SettingsView, &HistoryView];
        let titles: Vec<_> = views.iter().map(|v| v.title()).collect();
        assert_eq!(titles, vec!["Dashboard", "Settings", "History"]);
    }

    #[tokio::test]
    async fn test_dashboard_before_first_load() {
        let harness = Harness::new();
        let app = harness.app();
        let text = draw(&app);
        assert!(text.contains("Unknown"));
        assert!(text.contains("Not scheduled"));
        assert!(text.contains("Never"));
        assert!(text.contains("No digests yet"));
    }

    #[tokio::test]
    async fn test_dashboard_loaded() {
        let harness = Harness::with_history(vec![digest(4, "ada@example.org")]);
        let mut app = harness.app();
        app.start();
        app.sync_mut().settle().await;
        app.on_tick();

        let text = draw(&app);
        assert!(text.contains("Active"));
        assert!(text.contains("Weekdays at 8:00 AM"));
        assert!(text.contains("America/New_York"));
        assert!(text.contains("[Success]"));
        assert!(text.contains("[Failed]"));
        assert!(text.contains("agent timed out"));
        assert!(text.contains("[p] Pause"));
        assert!(text.contains("Paper number 2"));
        assert!(!text.contains("Paper number 3"));
        assert!(!text.contains("Summary of paper 0"));

        press(&mut app, KeyCode::Char('e'));
        assert!(draw(&app).contains("Summary of paper 0"));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_every_screen_renderable() {
        let harness = Harness::failing();
        let mut app = harness.app();
        app.start();
        app.sync_mut().settle().await;
        app.on_tick();

        let text = draw(&app);
        assert!(text.contains("Unknown"));
        assert!(text.contains("Request timed out"));
        assert!(!app.sync().can_toggle());

        press(&mut app, KeyCode::Char('2'));
        assert!(draw(&app).contains("Categories"));

        press(&mut app, KeyCode::Char('3'));
        assert!(draw(&app).contains("No digests yet"));
    }

    #[tokio::test]
    async fn test_settings_inline_error_and_saved_flash() {
        let harness = Harness::new();
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('s'));
        assert!(draw(&app).contains("email address is required"));

        press(&mut app, KeyCode::Enter);
        for c in "ada@example.org".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(draw(&app).contains("unsaved changes"));

        press(&mut app, KeyCode::Char('s'));
        let text = draw(&app);
        assert!(text.contains("Settings Saved"));
        assert!(!text.contains("email address is required"));
    }

    #[tokio::test]
    async fn test_history_why_this_matters() {
        let harness = Harness::with_history(vec![digest(2, "ada@example.org")]);
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('3'));

        let text = draw(&app);
        assert!(text.contains("History (1/1)"));
        assert!(!text.contains("Paper number 0"));

        press(&mut app, KeyCode::Enter);
        let text = draw(&app);
        assert!(text.contains("Paper number 0"));
        assert!(!text.contains("Why this matters"));

        press(&mut app, KeyCode::Char('w'));
        let text = draw(&app);
        assert!(text.contains("Why this matters: Why paper 1 matters"));
        assert!(text.contains("https://arxiv.org/abs/2410.00001"));
    }

    #[tokio::test]
    async fn test_history_no_match() {
        let harness = Harness::with_history(vec![digest(2, "ada@example.org")]);
        let mut app = harness.app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('/'));
        for c in "zzz".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(draw(&app).contains("No digests match \"zzz\""));
    }
}
