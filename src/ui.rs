use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use jurisdiction_quality::{
    DashboardAggregator, EntityClass, IssueCard, IssueCatalog, IssueResolution, IssueResolver,
    JurisdictionRow, SqliteStore,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Jurisdiction,
    Issues,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Jurisdiction => "Jurisdiction",
            Page::Issues => "Flagged Records",
        }
    }

    /// Page reached with Esc
    pub fn parent(&self) -> Option<Page> {
        match self {
            Page::Overview => None,
            Page::Jurisdiction => Some(Page::Overview),
            Page::Issues => Some(Page::Jurisdiction),
        }
    }
}

/// One line on the flagged-records page
#[derive(Debug, Clone, PartialEq)]
pub enum IssueLine {
    Group { description: String, count: usize },
    Entity { id: String, name: String },
}

pub struct App<'a> {
    conn: &'a Connection,
    pub current_page: Page,

    pub rows: Vec<JurisdictionRow>,
    pub overview_state: TableState,

    pub jurisdiction: Option<String>,
    pub cards: Vec<(EntityClass, IssueCard)>,
    pub cards_state: TableState,

    pub resolution: Option<IssueResolution>,
    pub issue_lines: Vec<IssueLine>,
    pub issues_state: TableState,

    /// Last load failure, shown in the status bar
    pub message: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(conn: &'a Connection) -> Result<Self> {
        let store = SqliteStore::new(conn);
        let rows = DashboardAggregator::new(IssueCatalog::global(), &store, &store).overview()?;

        let mut overview_state = TableState::default();
        if !rows.is_empty() {
            overview_state.select(Some(0));
        }

        Ok(Self {
            conn,
            current_page: Page::Overview,
            rows,
            overview_state,
            jurisdiction: None,
            cards: Vec::new(),
            cards_state: TableState::default(),
            resolution: None,
            issue_lines: Vec::new(),
            issues_state: TableState::default(),
            message: None,
        })
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Overview => self.rows.len(),
            Page::Jurisdiction => self.cards.len(),
            Page::Issues => self.issue_lines.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Overview => &mut self.overview_state,
            Page::Jurisdiction => &mut self.cards_state,
            Page::Issues => &mut self.issues_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    /// Drill into the selected row
    pub fn enter(&mut self) {
        self.message = None;

        match self.current_page {
            Page::Overview => {
                if let Some(name) = self
                    .overview_state
                    .selected()
                    .and_then(|i| self.rows.get(i))
                    .map(|row| row.name.clone())
                {
                    self.open_jurisdiction(&name);
                }
            }
            Page::Jurisdiction => {
                if let Some((class, slug)) = self
                    .cards_state
                    .selected()
                    .and_then(|i| self.cards.get(i))
                    .map(|(class, card)| (*class, card.slug.clone()))
                {
                    self.open_issues(class, &slug);
                }
            }
            Page::Issues => {}
        }
    }

    pub fn back(&mut self) {
        self.message = None;
        if let Some(parent) = self.current_page.parent() {
            self.current_page = parent;
        }
    }

    fn open_jurisdiction(&mut self, name: &str) {
        let store = SqliteStore::new(self.conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        match aggregator.jurisdiction_detail(name) {
            Ok(detail) => {
                self.cards = detail
                    .into_iter()
                    .flat_map(|(class, cards)| cards.into_iter().map(move |card| (class, card)))
                    .collect();
                self.cards_state
                    .select(if self.cards.is_empty() { None } else { Some(0) });
                self.jurisdiction = Some(name.to_string());
                self.current_page = Page::Jurisdiction;
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn open_issues(&mut self, class: EntityClass, slug: &str) {
        let Some(jurisdiction) = self.jurisdiction.clone() else {
            return;
        };
        let store = SqliteStore::new(self.conn);
        let resolver = IssueResolver::new(IssueCatalog::global(), &store, &store);

        match resolver.resolve_issues(&jurisdiction, class.as_str(), Some(slug)) {
            Ok(resolution) => {
                self.issue_lines = issue_lines(&resolution);
                self.issues_state
                    .select(if self.issue_lines.is_empty() { None } else { Some(0) });
                self.resolution = Some(resolution);
                self.current_page = Page::Issues;
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }
}

fn issue_lines(resolution: &IssueResolution) -> Vec<IssueLine> {
    let mut lines = Vec::new();

    for group in &resolution.groups {
        lines.push(IssueLine::Group {
            description: group.description.clone(),
            count: group.entities.len(),
        });
        lines.extend(group.entities.iter().map(|entity| IssueLine::Entity {
            id: entity.id().to_string(),
            name: entity.display_name(),
        }));
    }

    lines
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Esc if app.current_page == Page::Overview => return Ok(()),
                KeyCode::Esc | KeyCode::Backspace => app.back(),
                KeyCode::Enter => app.enter(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with breadcrumb
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Jurisdiction => render_cards(f, chunks[1], app),
        Page::Issues => render_issues(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        Page::Overview.title(),
        Style::default().fg(Color::Cyan),
    )];

    if app.current_page != Page::Overview {
        if let Some(name) = &app.jurisdiction {
            spans.push(Span::raw(" › "));
            spans.push(Span::styled(name.clone(), Style::default().fg(Color::Cyan)));
        }
    }

    if app.current_page == Page::Issues {
        if let Some(resolution) = &app.resolution {
            spans.push(Span::raw(" › "));
            spans.push(Span::styled(
                format!("{} ({})", resolution.class, resolution.total()),
                Style::default().fg(Color::Cyan),
            ));
        }
    }

    let errors: i64 = app.rows.iter().map(|r| r.error_total()).sum();
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Jurisdictions: {}", app.rows.len()),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("❗ {}", errors),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn count_cell(count: i64, alert: bool) -> Cell<'static> {
    let color = match (count, alert) {
        (0, _) => Color::DarkGray,
        (_, true) => Color::Red,
        (_, false) => Color::Yellow,
    };
    Cell::from(count.to_string()).style(Style::default().fg(color))
}

fn render_overview(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = [
        "Jurisdiction", "People", "Orgs", "No Memb.", "Bills", "No Actions", "Votes",
        "No Bill", "No Counts", "Last Run",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|row| {
        let run = match row.run {
            Some(status) if status.success => {
                Cell::from(format!("✓ {}", status.date)).style(Style::default().fg(Color::Green))
            }
            Some(status) => {
                Cell::from(format!("✗ {}", status.date)).style(Style::default().fg(Color::Red))
            }
            None => Cell::from("never").style(Style::default().fg(Color::DarkGray)),
        };

        Row::new(vec![
            Cell::from(truncate(&row.name, 30)),
            count_cell(row.people.warning, false),
            count_cell(row.organizations.warning, false),
            count_cell(row.organizations.no_memberships, true),
            count_cell(row.bills.warning, false),
            count_cell(row.bills.no_actions, true),
            count_cell(row.vote_events.warning, false),
            count_cell(row.vote_events.missing_bill, true),
            count_cell(row.vote_events.missing_counts, true),
            run,
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Jurisdictions "),
    )
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.overview_state);
}

fn render_cards(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Class", "Issue", "Count"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.cards.iter().map(|(class, card)| {
        let marker = if card.alert { "❗ " } else { "   " };
        Row::new(vec![
            Cell::from(class.as_str()),
            Cell::from(format!("{}{}", marker, card.description)),
            count_cell(card.count, card.alert),
        ])
        .height(1)
    });

    let title = format!(
        " {} ",
        app.jurisdiction.as_deref().unwrap_or(Page::Jurisdiction.title())
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Min(40),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.cards_state);
}

fn render_issues(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.issue_lines.iter().map(|line| match line {
        IssueLine::Group { description, count } => Row::new(vec![
            Cell::from(format!("{} ({})", description, count)).style(header_style()),
            Cell::from(""),
        ]),
        IssueLine::Entity { id, name } => Row::new(vec![
            Cell::from(format!("  {}", truncate(name, 60))),
            Cell::from(id.clone()).style(Style::default().fg(Color::DarkGray)),
        ]),
    });

    let title = match app.resolution.as_ref().and_then(|r| r.edit_link) {
        Some(link) => format!(" {} · edit via {} ", Page::Issues.title(), link.as_str()),
        None => format!(" {} ", Page::Issues.title()),
    };
    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(highlight_style())
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.issues_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(message) = &app.message {
        status_spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Red),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if app.current_page != Page::Issues {
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Drill down | "));
    }
    if app.current_page != Page::Overview {
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Back | "));
    }
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
