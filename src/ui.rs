use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use rule_curator::{EditingSession, RuleSource};
use std::io;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Waiting for y/n before writing the overlay file
    ConfirmCommit,
}

pub struct App {
    pub session: EditingSession,
    pub state: TableState,
    pub mode: Mode,
    pub show_preview: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new(session: EditingSession) -> Self {
        let mut state = TableState::default();
        if session.rule_count() > 0 {
            state.select(Some(0));
        }

        Self {
            session,
            state,
            mode: Mode::Browse,
            show_preview: false,
            status: None,
        }
    }

    pub fn selected_name(&self) -> Option<String> {
        let names = self.session.sorted_names();
        self.state
            .selected()
            .and_then(|i| names.get(i))
            .map(|name| name.to_string())
    }

    pub fn toggle_selected(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };

        self.status = Some(match self.session.toggle(&name) {
            Ok(true) => format!("🗑️ Staged for deletion: {}", name),
            Ok(false) => format!("✅ Unstaged: {}", name),
            Err(e) => format!("❌ {}", e),
        });
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    /// Ask for confirmation, or report that there is nothing to save
    pub fn request_commit(&mut self) {
        if self.session.staged_count() == 0 {
            self.status = Some("ℹ️ No rules staged for deletion".to_string());
        } else {
            self.mode = Mode::ConfirmCommit;
        }
    }

    pub fn confirm_commit(&mut self) {
        self.mode = Mode::Browse;

        self.status = Some(match self.session.commit() {
            Ok(result) => format!(
                "✅ Removed {} rules, {} remain → {}",
                result.removed_count,
                result.remaining_count,
                result.path.display()
            ),
            Err(e) if e.is_informational() => format!("ℹ️ {}", e),
            Err(e) => format!("❌ {}", e),
        });

        self.clamp_selection();
    }

    pub fn cancel_commit(&mut self) {
        self.mode = Mode::Browse;
        self.status = Some("Save cancelled".to_string());
    }

    pub fn reload(&mut self) {
        self.status = Some(match self.session.reload() {
            Ok(()) => format!(
                "🔄 Reloaded {} ({} rules)",
                self.session.authoritative_path().display(),
                self.session.rule_count()
            ),
            Err(e) => format!("❌ {}", e),
        });

        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.session.rule_count();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    pub fn next(&mut self) {
        let len = self.session.rule_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.session.rule_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.session.rule_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_SIZE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.session.rule_count() == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_SIZE));
        self.state.select(Some(i));
    }

    pub fn home(&mut self) {
        if self.session.rule_count() > 0 {
            self.state.select(Some(0));
        }
    }

    pub fn end(&mut self) {
        let len = self.session.rule_count();
        if len > 0 {
            self.state.select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.mode {
            Mode::ConfirmCommit => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_commit(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_commit(),
                _ => {}
            },
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('d') => app.toggle_selected(),
                KeyCode::Char('p') => app.toggle_preview(),
                KeyCode::Char('s') => app.request_commit(),
                KeyCode::Char('r') => app.reload(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.home(),
                KeyCode::End => app.end(),
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with file info
            Constraint::Min(0),    // Rule list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_preview {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(55), // Rule list
                Constraint::Percentage(45), // Export preview
            ])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_preview(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);

    if app.mode == Mode::ConfirmCommit {
        let area = f.size();
        render_confirm(f, area, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let (label, color) = match session.source() {
        RuleSource::Original => ("📁 Original file", Color::Cyan),
        RuleSource::Overlay => ("📁 Modified file", Color::Green),
    };

    let mut spans = vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            session.authoritative_path().display().to_string(),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Rules: {}", session.rule_count()),
            Style::default().fg(Color::White),
        ),
    ];

    if session.staged_count() > 0 {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Staged: {}", session.staged_count()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Rule"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    // Rows are rebuilt from session state on every draw
    let session = &app.session;
    let rows = session.sorted_names().into_iter().map(|name| {
        let (mark, style) = if session.is_staged(name) {
            (
                "✅",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT),
            )
        } else {
            ("❌", Style::default().fg(Color::White))
        };

        Row::new(vec![Cell::from(mark), Cell::from(name.to_string()).style(style)]).height(1)
    });

    let table = Table::new(rows, [Constraint::Length(4), Constraint::Min(10)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Rules (Space to stage/unstage for deletion) "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_preview(f: &mut Frame, area: Rect, app: &App) {
    let active = app.session.export_active();
    let title = format!(
        " Export Preview ({} rules, {} excluded) ",
        active.len(),
        app.session.staged_count()
    );

    let preview = Paragraph::new(app.session.export_json())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title),
        );

    f.render_widget(preview, area);
}

fn render_confirm(f: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(60, 60, area);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete these {} rules?", app.session.staged_count()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for name in app.session.staged() {
        content.push(Line::from(format!("  • {}", name)));
    }
    content.push(Line::from(""));
    content.push(Line::from(format!(
        "  Saved to: {}",
        app.session.overlay_path().display()
    )));
    content.push(Line::from(format!(
        "  Original kept: {}",
        app.session.original_path().display()
    )));
    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("y", Style::default().fg(Color::Yellow)),
        Span::raw(" confirm  "),
        Span::styled("n", Style::default().fg(Color::Yellow)),
        Span::raw(" cancel"),
    ]));

    let dialog = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm Save "),
    );

    f.render_widget(Clear, popup);
    f.render_widget(dialog, popup);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.session.rule_count();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Stage | "));
    status_spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Save | "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Preview | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reload | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
