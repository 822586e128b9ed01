use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::arena::ring::Surface;
use crate::arena::Arena;
use crate::logging::create_log_widget;
use crate::robot::state::BehavioralState;

/// Margin drawn around the ring (fraction of its radius)
const VIEW_MARGIN: f32 = 1.1;

pub fn render_app(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(5)])
        .split(columns[1]);

    render_arena(frame, columns[0], app);
    render_status(frame, side[0], app);
    frame.render_widget(create_log_widget(), side[1]);
}

fn render_arena(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Dohyo");
    let inner = block.inner(area);
    let lines = match app.arena.read() {
        Ok(arena) => create_arena_lines(&arena, inner.width, inner.height),
        Err(_) => vec![Line::from("arena unavailable")],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Terminal cells are roughly twice as tall as wide
fn create_arena_lines(arena: &Arena, width: u16, height: u16) -> Vec<Line<'static>> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let span = 2.0 * arena.ring.radius * VIEW_MARGIN;
    let mm_per_col = (span / width as f32).max(span / (2.0 * height as f32));
    let mm_per_row = 2.0 * mm_per_col;

    let robot_radius = arena.config.robot_radius_mm;
    let opponent_radius = arena.config.opponent_radius_mm;
    let nose = arena.robot.offset(robot_radius * 0.7, 0.0);

    (0..height)
        .map(|row| {
            let y = (height as f32 / 2.0 - row as f32 - 0.5) * mm_per_row;
            let spans: Vec<Span> = (0..width)
                .map(|col| {
                    let x = (col as f32 - width as f32 / 2.0 + 0.5) * mm_per_col;
                    let near_nose = (x - nose.0).abs() <= mm_per_col / 2.0
                        && (y - nose.1).abs() <= mm_per_row / 2.0;
                    let symbol = if near_nose {
                        '*'
                    } else if arena.robot.distance_to(x, y) <= robot_radius {
                        'R'
                    } else if arena.opponent.distance_to(x, y) <= opponent_radius {
                        'O'
                    } else {
                        match arena.ring.surface_at(x, y) {
                            Surface::Mat => '.',
                            Surface::Border => '#',
                            Surface::Floor => ' ',
                        }
                    };
                    create_styled_span(symbol)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn create_styled_span(c: char) -> Span<'static> {
    let style = match c {
        '#' => Style::default().fg(Color::DarkGray),
        '.' => Style::default().fg(Color::White),
        'R' => Style::default().fg(Color::Green).bold(),
        '*' => Style::default().fg(Color::Yellow).bold(),
        'O' => Style::default().fg(Color::Red).bold(),
        _ => Style::default(),
    };
    Span::styled(c.to_string(), style)
}

fn state_color(state: BehavioralState) -> Color {
    match state {
        BehavioralState::Searching => Color::Blue,
        BehavioralState::Found => Color::Yellow,
        BehavioralState::Seeking => Color::Magenta,
        BehavioralState::Pushing => Color::Red,
    }
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let status = app.status_snapshot();
    let (pushed_out, wheels) = app
        .arena
        .read()
        .map(|arena| {
            (
                arena.pushed_out,
                if arena.is_moving() { "turning" } else { "idle" },
            )
        })
        .unwrap_or((0, "?"));

    let range = status
        .last_range_mm
        .map(|mm| format!("{:.0} mm", mm))
        .unwrap_or_else(|| "-".to_string());
    let command = status
        .last_command
        .map(|command| command.to_string())
        .unwrap_or_else(|| "-".to_string());
    let binding = &app.binding;

    let lines = vec![
        Line::from(vec![
            Span::raw("State:      "),
            Span::styled(
                if app.waiting() {
                    "Waiting".to_string()
                } else {
                    status.state.to_string()
                },
                Style::default().fg(state_color(status.state)).bold(),
            ),
            Span::raw(if app.stopping() { "  (stopping)" } else { "" }),
        ]),
        Line::from(format!("Cycles:     {}", status.cycles)),
        Line::from(format!("Last range: {}", range)),
        Line::from(format!("Edge saves: {}", status.edge_recoveries)),
        Line::from(format!("Command:    {} (wheels {})", command, wheels)),
        Line::from(format!("Pushed out: {}", pushed_out)),
        Line::from(format!(
            "Started:    {} (up {})",
            app.started_at.format("%H:%M:%S"),
            app.uptime()
        )),
        Line::from(format!(
            "Wiring:     bump {}/{} range {} light {}",
            binding.left_bumper, binding.right_bumper, binding.range, binding.light
        )),
        Line::from(if app.waiting() {
            "Press enter to start, [q] quit".yellow()
        } else {
            "[enter]/[q] stop".dark_gray()
        }),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Controller")),
        area,
    );
}
