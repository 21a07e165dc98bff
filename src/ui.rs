use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use edu_roster::{temporal, Band, Person, Projection, Roster, RosterError};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine, Points},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Roster,
    Views,
    Projection,
    AgeVsBand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    None,
    ByBand(Band),
    ByAgeRange(i64, i64),
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub active_filter: FilterType,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Roster => Page::Views,
            Page::Views => Page::Projection,
            Page::Projection => Page::AgeVsBand,
            Page::AgeVsBand => Page::Roster,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Roster => Page::AgeVsBand,
            Page::Views => Page::Roster,
            Page::Projection => Page::Views,
            Page::AgeVsBand => Page::Projection,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Roster => "Roster",
            Page::Views => "Views",
            Page::Projection => "Projection",
            Page::AgeVsBand => "Age vs Band",
        }
    }
}

pub struct App {
    pub roster: Roster,
    pub people: Vec<Person>,
    pub filtered_people: Vec<Person>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter_state: FilterState,
    pub projection: Result<Projection, RosterError>,
    pub message: Option<String>,
}

impl App {
    pub fn new(roster: Roster) -> Self {
        let people = roster.snapshot();
        let projection = roster.project();

        let mut state = TableState::default();
        if !people.is_empty() {
            state.select(Some(0));
        }

        Self {
            filtered_people: people.clone(),
            people,
            roster,
            state,
            current_page: Page::Roster,
            show_detail: false,
            filter_state: FilterState {
                active_filter: FilterType::None,
            },
            projection,
            message: None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_person(&self) -> Option<&Person> {
        self.state.selected().and_then(|i| self.filtered_people.get(i))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        let result = match &filter {
            FilterType::None => Ok(self.people.clone()),
            FilterType::ByBand(band) => Ok(self.roster.find_by_band(band.as_str())),
            FilterType::ByAgeRange(min, max) => self.roster.find_by_age_range(*min, *max),
        };

        match result {
            Ok(found) => {
                self.filtered_people = found;
                self.filter_state.active_filter = filter;
                self.message = None;
            }
            Err(err) => {
                self.message = Some(err.to_string());
                return;
            }
        }

        // Reset selection to first item
        if !self.filtered_people.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.filtered_people.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_people.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
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
            let on_views = app.current_page == Page::Views;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Roster;
                }
                KeyCode::Char(digit @ '1'..='7') if on_views => {
                    let idx = digit as usize - '1' as usize;
                    app.apply_filter(FilterType::ByBand(Band::ALL[idx]));
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('m') if on_views => {
                    app.apply_filter(FilterType::ByAgeRange(0, 17));
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('a') if on_views => {
                    app.apply_filter(FilterType::ByAgeRange(18, 150));
                    app.current_page = Page::Roster;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.filtered_people.is_empty() {
                        app.state.select(Some(app.filtered_people.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Roster {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Roster => render_table(f, chunks[1], app),
            Page::Views => render_views(f, chunks[1], app),
            Page::Projection => render_projection(f, chunks[1], app),
            Page::AgeVsBand => render_age_vs_band(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn band_color(band: Band) -> Color {
    match band {
        Band::Kinder => Color::LightMagenta,
        Band::PreK => Color::Magenta,
        Band::Primary => Color::Blue,
        Band::Secondary => Color::Cyan,
        Band::University => Color::Green,
        Band::OtherHigherEd => Color::Yellow,
        Band::NotApplicable => Color::DarkGray,
    }
}

/// Cold-to-warm ramp so older points stand out
fn age_color(age: u32) -> Color {
    match age {
        0..=5 => Color::Blue,
        6..=12 => Color::Cyan,
        13..=17 => Color::Green,
        18..=25 => Color::Yellow,
        26..=40 => Color::LightRed,
        _ => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Roster, Page::Views, Page::Projection, Page::AgeVsBand];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("People: {}", app.people.len()),
        Style::default().fg(Color::White),
    ));
    if let Some(mean) = app.roster.mean_age() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Mean age: {:.1}", mean),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Birth date", "Age", "Band", "Declared"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_people.iter().map(|p| {
        let color = band_color(p.band());
        let declared = p
            .declared_level()
            .map(|b| b.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        let cells = vec![
            Cell::from(truncate(&p.full_name(), 30)),
            Cell::from(temporal::format_birth_date(p.birth_date())),
            Cell::from(format!("{}", p.age())),
            Cell::from(p.band().as_str()).style(Style::default().fg(color)),
            Cell::from(declared),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(15),
            Constraint::Length(15),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Roster "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Person Details ");

    let person = match app.selected_person() {
        Some(p) => p,
        None => {
            f.render_widget(Paragraph::new("No person selected").block(block), area);
            return;
        }
    };

    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let field = |name: &str, value: String| {
        Line::from(vec![Span::styled(format!("  {}: ", name), key), Span::raw(value)])
    };

    let content = vec![
        Line::from(""),
        field("Name", person.full_name()),
        field("Birth date", temporal::format_birth_date(person.birth_date())),
        field("Age", format!("{} years", person.age())),
        Line::from(vec![
            Span::styled("  Band: ", key),
            Span::styled(
                person.band().description(),
                Style::default().fg(band_color(person.band())),
            ),
        ]),
        field(
            "Declared",
            person
                .declared_level()
                .map(|b| b.description().to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        field("Evaluated on", person.evaluated_on().to_string()),
        field("ID", person.id().to_string()),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_views(f: &mut Frame, area: Rect, app: &App) {
    let counts = app.roster.band_counts();
    let hint = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Quick Views & Filters",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    for (i, band) in Band::ALL.iter().enumerate() {
        let active = app.filter_state.active_filter == FilterType::ByBand(*band);
        content.push(Line::from(vec![
            Span::raw("  "),
            if active {
                Span::styled("→", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::raw(" ")
            },
            Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(format!(". {:<40}", band.description())),
            Span::styled(
                format!("{:>4} people", counts.get(band).copied().unwrap_or(0)),
                Style::default().fg(band_color(*band)),
            ),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("m", Style::default().fg(Color::Yellow)),
        Span::raw(". Minors (0-17)"),
    ]));
    content.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("a", Style::default().fg(Color::Yellow)),
        Span::raw(". Adults (18+)"),
    ]));
    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press 1-7, m or a to filter, c to clear",
        hint,
    )]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Views - Quick Access Filters "),
    );

    f.render_widget(paragraph, area);
}

/// Bounds covering every value with 10% padding on each side
fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [-1.0, 1.0];
    }
    let pad = ((max - min) * 0.1).max(0.5);
    [min - pad, max + pad]
}

fn render_projection(f: &mut Frame, area: Rect, app: &App) {
    let projection = match &app.projection {
        Ok(projection) => projection,
        Err(err) => {
            let message = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  {}", err),
                    Style::default().fg(Color::Red),
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Projection unavailable "),
            );
            f.render_widget(message, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let two_d = projection.n_components() == 2;
    let point = |coords: &[f64]| -> (f64, f64) {
        (coords[0], if two_d { coords[1] } else { 0.0 })
    };

    let points: Vec<(f64, f64)> = projection.coordinates.iter().map(|c| point(c.as_slice())).collect();
    let aggregate = point(projection.aggregate_point.as_slice());
    let centroids: Vec<(Band, (f64, f64))> = projection
        .band_centroids
        .iter()
        .map(|(band, c)| (*band, point(c.as_slice())))
        .collect();

    let all = points
        .iter()
        .copied()
        .chain(std::iter::once(aggregate))
        .chain(centroids.iter().map(|(_, c)| *c));
    let (xs, ys): (Vec<f64>, Vec<f64>) = all.unzip();
    let x_bounds = padded_bounds(xs.into_iter());
    let y_bounds = padded_bounds(ys.into_iter());

    let title = if two_d {
        format!(
            " 2D projection  x: {}  y: {} ",
            projection.axis_label(0),
            projection.axis_label(1)
        )
    } else {
        format!(" 1D projection  x: {} ", projection.axis_label(0))
    };

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            // Trajectory in roster order
            for pair in points.windows(2) {
                ctx.draw(&CanvasLine {
                    x1: pair[0].0,
                    y1: pair[0].1,
                    x2: pair[1].0,
                    y2: pair[1].1,
                    color: Color::Red,
                });
            }

            // Spokes from each point to its band centroid
            for (p, band) in points.iter().zip(&projection.bands) {
                if let Some((_, c)) = centroids.iter().find(|(b, _)| b == band) {
                    ctx.draw(&CanvasLine {
                        x1: p.0,
                        y1: p.1,
                        x2: c.0,
                        y2: c.1,
                        color: Color::DarkGray,
                    });
                }
            }

            ctx.layer();

            for (p, age) in points.iter().zip(&projection.ages) {
                ctx.draw(&Points {
                    coords: &[*p],
                    color: age_color(*age),
                });
            }

            for (band, c) in &centroids {
                ctx.print(c.0, c.1, Span::styled("◆", Style::default().fg(band_color(*band))));
            }

            ctx.print(
                aggregate.0,
                aggregate.1,
                Span::styled("★", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            );

            if projection.annotate {
                for (p, label) in points.iter().zip(&projection.labels) {
                    ctx.print(p.0, p.1, Span::styled(label.clone(), Style::default().fg(Color::Gray)));
                }
            }
        });

    f.render_widget(canvas, chunks[0]);

    let mut side: Vec<Line> = projection
        .summary()
        .lines()
        .map(|l| Line::from(format!(" {}", l)))
        .collect();
    side.push(Line::from(""));
    side.push(Line::from(vec![
        Span::styled(" ★", Style::default().fg(Color::Red)),
        Span::raw(" Mean of the roster"),
    ]));
    for (band, _) in &centroids {
        side.push(Line::from(vec![
            Span::styled(" ◆", Style::default().fg(band_color(*band))),
            Span::raw(format!(" Centroid {}", band)),
        ]));
    }

    let panel = Paragraph::new(side).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Summary "),
    );
    f.render_widget(panel, chunks[1]);
}

fn render_age_vs_band(f: &mut Frame, area: Rect, app: &App) {
    let max_age = app.people.iter().map(|p| p.age()).max().unwrap_or(0) as f64;

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Age vs Band (code) "),
        )
        .marker(Marker::Braille)
        .x_bounds([-8.0, max_age + 5.0])
        .y_bounds([-0.5, 6.5])
        .paint(|ctx| {
            for band in Band::ALL {
                ctx.print(
                    -8.0,
                    f64::from(band.code()),
                    Span::styled(band.as_str(), Style::default().fg(band_color(band))),
                );
            }

            ctx.layer();

            for person in &app.people {
                ctx.draw(&Points {
                    coords: &[(f64::from(person.age()), f64::from(person.band().code()))],
                    color: age_color(person.age()),
                });
            }
        });

    f.render_widget(canvas, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_people.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    let filter_name = match &app.filter_state.active_filter {
        FilterType::None => None,
        FilterType::ByBand(band) => Some(band.as_str().to_string()),
        FilterType::ByAgeRange(min, max) => Some(format!("age {}-{}", min, max)),
    };
    if let Some(name) = filter_name {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    if let Some(message) = &app.message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Red)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
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
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
