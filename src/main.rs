use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
};

use fpl_moneyball::config::AppConfig;
use fpl_moneyball::export;
use fpl_moneyball::feed;
use fpl_moneyball::fetch::{HttpSource, MemoizedSource};
use fpl_moneyball::players::{Player, Position};
use fpl_moneyball::state::{
    AppState, Delta, EMPTY_RESULT_MESSAGE, LoadStatus, ProviderCommand, apply_delta,
};
use fpl_moneyball::trend::fit_trend;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.toggle_position(Position::Gkp),
            KeyCode::Char('2') => self.state.toggle_position(Position::Def),
            KeyCode::Char('3') => self.state.toggle_position(Position::Mid),
            KeyCode::Char('4') => self.state.toggle_position(Position::Fwd),
            KeyCode::Tab => self.state.cycle_focus(),
            KeyCode::Left | KeyCode::Char('h') => self.state.adjust_focused(-1),
            KeyCode::Right | KeyCode::Char('l') => self.state.adjust_focused(1),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('r') => self.request_refresh(false),
            KeyCode::Char('R') => self.request_refresh(true),
            KeyCode::Char('e') => self.export_visible(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_refresh(&mut self, force: bool) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx.send(ProviderCommand::Refresh { force }).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.status = LoadStatus::Loading;
            self.state.push_log(if force {
                "[INFO] Forced refresh requested"
            } else {
                "[INFO] Refresh requested"
            });
        }
    }

    fn export_visible(&mut self) {
        let path = export::default_export_path();
        let result = export::export_players_xlsx(&path, &self.state.visible_players());
        match result {
            Ok(n) => self
                .state
                .push_log(format!("[INFO] Exported {n} players to {}", path.display())),
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.state.push_log(format!("[WARN] Export failed: {err:#}"));
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing()?;

    let cfg = AppConfig::from_env();
    tracing::info!(
        bootstrap = %cfg.bootstrap_url,
        fixtures = %cfg.fixtures_url,
        ttl_secs = cfg.cache_ttl.as_secs(),
        "dashboard starting"
    );

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let source = MemoizedSource::new(HttpSource::new(&cfg), cfg.cache_ttl);
    feed::spawn_provider(tx, cmd_rx, source, cfg.schedule.clone(), cfg.cache_ttl);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(AppState::new(cfg.default_filter.clone()), Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

/// Log to a file; the terminal belongs to the TUI.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("fpl_moneyball.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fpl_moneyball=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "1-4 Positions | Tab Control | ←/→ Adjust | j/k Move | s Sort | r Refresh | e Export | ? Help | q Quit",
    );
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let status = match &state.status {
        LoadStatus::Loading => "LOADING".to_string(),
        LoadStatus::Ready => match state.table_updated {
            Some(at) => {
                let local: chrono::DateTime<chrono::Local> = at.into();
                format!("UPDATED {}", local.format("%H:%M:%S"))
            }
            None => "READY".to_string(),
        },
        LoadStatus::Failed(_) if state.table.is_some() => "STALE".to_string(),
        LoadStatus::Failed(_) => "ERROR".to_string(),
    };
    let line1 = format!("FPL MONEYBALL | xGI & Fixtures | {status}");
    let line2 = format!(
        "Filter: {} | Editing: {} | Sort: {}",
        state.filter.describe(),
        state.focus.label(),
        state.sort.label()
    );
    format!("{line1}\n{line2}")
}

fn render_body(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(msg) = state.blocking_error() {
        let err = Paragraph::new(format!("Failed to load FPL data:\n{msg}\n\nPress r to retry."))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().title("Error").borders(Borders::ALL));
        frame.render_widget(err, area);
        return;
    }
    if state.table.is_none() {
        let loading = Paragraph::new("Fetching bootstrap-static and fixtures...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, area);
        return;
    }

    let rows = state.visible_players();
    if rows.is_empty() {
        let empty = Paragraph::new(EMPTY_RESULT_MESSAGE)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    render_chart(frame, sections[0], &rows);
    render_table(frame, sections[1], state, &rows);

    let detail = Paragraph::new(selected_detail_text(state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(detail, sections[2]);
}

fn position_color(pos: Position) -> Color {
    match pos {
        Position::Gkp => Color::Rgb(0xFF, 0xBC, 0x42),
        Position::Def => Color::Rgb(0x04, 0x96, 0xFF),
        Position::Mid => Color::Rgb(0xD8, 0x11, 0x59),
        Position::Fwd => Color::Rgb(0x8F, 0x2D, 0x56),
    }
}

// FPL difficulty runs 1 (easiest) to 5.
fn difficulty_color(avg: Option<f64>) -> Color {
    match avg {
        Some(d) if d < 2.5 => Color::Green,
        Some(d) if d < 3.5 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::Gray,
    }
}

fn render_chart(frame: &mut Frame, area: Rect, rows: &[&Player]) {
    let points: Vec<(Position, f64, f64)> = rows
        .iter()
        .filter_map(|p| Some((p.position?, p.price?, p.expected_goal_involvements?)))
        .collect();

    let by_position: Vec<(Position, Vec<(f64, f64)>)> = Position::ALL
        .into_iter()
        .map(|pos| {
            let data = points
                .iter()
                .filter(|(p, _, _)| *p == pos)
                .map(|(_, x, y)| (*x, *y))
                .collect::<Vec<_>>();
            (pos, data)
        })
        .filter(|(_, data)| !data.is_empty())
        .collect();

    let xy: Vec<(f64, f64)> = points.iter().map(|(_, x, y)| (*x, *y)).collect();
    let x_min = xy.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let x_max = xy.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);
    let y_max = xy.iter().map(|(_, y)| *y).fold(0.0_f64, f64::max);
    let (x_min, x_max) = if x_min.is_finite() && x_max > x_min {
        (x_min.floor(), x_max.ceil())
    } else {
        (0.0, 15.0)
    };
    let y_max = if y_max > 0.0 { y_max.ceil() } else { 1.0 };

    let trend_points: Vec<(f64, f64)> = fit_trend(&xy)
        .map(|line| vec![(x_min, line.at(x_min)), (x_max, line.at(x_max))])
        .unwrap_or_default();

    let mut datasets: Vec<Dataset> = by_position
        .iter()
        .map(|(pos, data)| {
            Dataset::default()
                .name(pos.label())
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(position_color(*pos)))
                .data(data)
        })
        .collect();
    if !trend_points.is_empty() {
        datasets.push(
            Dataset::default()
                .name("trend")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::White))
                .data(&trend_points),
        );
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title("Price vs Expected Goal Involvement (xGI)")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Price (£m)")
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{x_min:.1}")),
                    Span::raw(format!("{:.1}", (x_min + x_max) / 2.0)),
                    Span::raw(format!("{x_max:.1}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("xGI")
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.1}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.1}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState, rows: &[&Player]) {
    let header = Row::new(
        ["Player", "Team", "Pos", "£m", "Mins", "Pts", "xGI", "xGI/90", "FDR", "Next 5"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))),
    );

    let visible = area.height.saturating_sub(3) as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible.max(1));

    let body = rows[start..end].iter().enumerate().map(|(i, p)| {
        let style = if start + i == state.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(p.name.clone()),
            Cell::from(p.team_name.clone().unwrap_or_else(|| "-".to_string())),
            Cell::from(p.position.map(|pos| pos.label()).unwrap_or("-"))
                .style(Style::default().fg(p.position.map(position_color).unwrap_or(Color::Gray))),
            Cell::from(opt_fmt(p.price, 1)),
            Cell::from(p.minutes.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::from(
                p.total_points
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::from(opt_fmt(p.expected_goal_involvements, 2)),
            Cell::from(format!("{:.2}", p.xgi_per_90)),
            Cell::from(opt_fmt(p.fixture_difficulty, 1))
                .style(Style::default().fg(difficulty_color(p.fixture_difficulty))),
            Cell::from(p.next_5_fixtures.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(4),
        Constraint::Min(20),
    ];
    let table = Table::new(body, widths).header(header).block(
        Block::default()
            .title(format!("Players ({})", rows.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, area);
}

fn selected_detail_text(state: &AppState) -> String {
    let Some(p) = state.selected_player() else {
        return "No player selected".to_string();
    };
    let chance = p
        .chance_of_playing_next_round
        .map(|c| format!("{c}%"))
        .unwrap_or_else(|| "-".to_string());
    let fixtures = if p.next_5_fixtures.is_empty() {
        "none scheduled".to_string()
    } else {
        p.next_5_fixtures.clone()
    };
    format!(
        "{} ({}) | Chance next round: {chance} | Upcoming: {fixtures} | Avg difficulty: {}",
        p.name,
        p.team_name.as_deref().unwrap_or("-"),
        opt_fmt(p.fixture_difficulty, 1)
    )
}

fn opt_fmt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FPL Moneyball - Help",
        "",
        "Filters:",
        "  1 2 3 4      Toggle GKP / DEF / MID / FWD",
        "  Tab          Cycle min price / max price / min minutes",
        "  ← / →        Adjust the selected control",
        "",
        "Table:",
        "  j/k or ↑/↓   Move selection",
        "  s            Cycle sort (xGI/90, xGI, price, points, minutes)",
        "  e            Export visible rows to .xlsx",
        "",
        "Data:",
        "  r            Refresh (uses cached payloads if fresh)",
        "  R            Force refresh",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
