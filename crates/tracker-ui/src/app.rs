//! Main application state and TUI event loop for the cost tracker.
//!
//! [`App`] owns the theme, the loaded [`Session`], and the currently rendered
//! [`ViewState`]. Key handling is a pure state update so it can be tested
//! without a terminal.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame, Terminal,
};

use tracker_core::error::TrackerError;
use tracker_data::source::FileSource;
use tracker_runtime::dashboard::{DashboardView, Session};

use crate::components::header::Header;
use crate::dashboard_view;
use crate::diagnostics_view;
use crate::table_view;
use crate::themes::Theme;

// ── Screen ────────────────────────────────────────────────────────────────────

/// Which screen the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Tables,
    Diagnostics,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Dashboard, Screen::Tables, Screen::Diagnostics];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Tables => "Tables",
            Screen::Diagnostics => "Diagnostics",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Screen::Dashboard => Screen::Tables,
            Screen::Tables => Screen::Diagnostics,
            Screen::Diagnostics => Screen::Dashboard,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }
}

// ── ViewState ─────────────────────────────────────────────────────────────────

/// What the dashboard and tables screens currently show.
#[derive(Debug, Clone)]
pub enum ViewState {
    Ready(DashboardView),
    /// The upload held no valid records.
    NoValidData,
    /// The selected period has no records, or building the view failed.
    Failed(String),
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the cost tracker TUI.
pub struct App<S: FileSource> {
    pub theme: Theme,
    pub screen: Screen,
    pub session: Session<S>,
    pub view: ViewState,
    /// Scroll offset of the records table or the diagnostics list.
    pub scroll: usize,
    /// One-line status shown in the footer (reload results, ...).
    pub status: Option<String>,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl<S: FileSource> App<S> {
    pub fn new(session: Session<S>, theme_name: &str) -> Self {
        let mut app = Self {
            theme: Theme::from_name(theme_name),
            screen: Screen::Dashboard,
            session,
            view: ViewState::NoValidData,
            scroll: 0,
            status: None,
            should_quit: false,
        };
        app.refresh_view();
        app
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q`, `Q`, or `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop stays
    /// on the current thread.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key)
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State updates ─────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.step_period(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_period(1),
            KeyCode::Tab => {
                self.screen = self.screen.next();
                self.scroll = 0;
            }
            KeyCode::BackTab => {
                self.screen = self.screen.prev();
                self.scroll = 0;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    /// Re-read the upload; the footer reports what happened.
    pub fn reload(&mut self) {
        match self.session.reload() {
            Ok(true) => {
                self.status = Some(format!(
                    "Reloaded {} records",
                    self.session.records().len()
                ));
                self.scroll = 0;
                self.refresh_view();
            }
            Ok(false) => self.status = Some("File unchanged".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "reload failed");
                self.status = Some(format!("Reload failed: {}", e));
            }
        }
    }

    fn step_period(&mut self, step: isize) {
        let before = self.session.selected_period().map(str::to_string);
        self.session.step_period(step);
        if self.session.selected_period() != before.as_deref() {
            self.scroll = 0;
            self.refresh_view();
        }
    }

    /// Rebuild [`App::view`] for the selected period.
    pub fn refresh_view(&mut self) {
        self.view = match self.session.view() {
            Ok(Some(view)) => ViewState::Ready(view),
            Ok(None) => ViewState::NoValidData,
            Err(e @ TrackerError::NoDataForPeriod(_)) => ViewState::Failed(e.to_string()),
            Err(e) => {
                tracing::error!(error = %e, "failed to build dashboard view");
                ViewState::Failed(e.to_string())
            }
        };
    }

    fn max_scroll(&self) -> usize {
        match (self.screen, &self.view) {
            (Screen::Tables, ViewState::Ready(view)) => table_view::max_scroll(view),
            (Screen::Diagnostics, _) => self.session.diagnostics().len().saturating_sub(1),
            _ => 0,
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Length(1), // Tabs
                Constraint::Min(5),    // Body
                Constraint::Length(1), // Footer
            ])
            .split(frame.area());

        let identity = self.session.identity();
        let header = Header::new(&identity, self.session.selected_period(), &self.theme);
        frame.render_widget(Paragraph::new(Text::from(header.to_lines())), chunks[0]);
        frame.render_widget(Paragraph::new(self.tabs_line()), chunks[1]);

        self.render_body(frame, chunks[2]);

        frame.render_widget(Paragraph::new(self.footer_line()), chunks[3]);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        if self.screen == Screen::Diagnostics {
            diagnostics_view::render_diagnostics(
                frame,
                area,
                self.session.diagnostics(),
                self.scroll,
                &self.theme,
            );
            return;
        }

        match &self.view {
            ViewState::Ready(view) => match self.screen {
                Screen::Tables => {
                    table_view::render_tables(frame, area, view, self.scroll, &self.theme)
                }
                _ => dashboard_view::render_dashboard(frame, area, view, &self.theme),
            },
            ViewState::NoValidData => dashboard_view::render_status(
                frame,
                area,
                "No data",
                "No valid data found to process.",
                self.theme.warning,
                &self.theme,
            ),
            ViewState::Failed(message) => dashboard_view::render_status(
                frame,
                area,
                self.session.selected_period().unwrap_or("Error"),
                message,
                self.theme.error,
                &self.theme,
            ),
        }
    }

    fn tabs_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for screen in Screen::ALL {
            let style = if screen == self.screen {
                self.theme.tab_active
            } else {
                self.theme.tab_inactive
            };
            let label = if screen == Screen::Diagnostics {
                format!("{} ({})", screen.title(), self.session.diagnostics().len())
            } else {
                screen.title().to_string()
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw("   "));
        }
        Line::from(spans)
    }

    fn footer_line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            "←/→ period  Tab screen  j/k scroll  r reload  q quit",
            self.theme.dim,
        )];
        if let Some(status) = &self.status {
            spans.push(Span::styled(format!("   {}", status), self.theme.info));
        }
        Line::from(spans)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
