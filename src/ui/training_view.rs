use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Sparkline},
    Frame,
};

use super::board_widget;
use super::training_dashboard::{DashboardState, TrainingStatus};
use crate::game::GameResult;

/// Render the full training dashboard.
pub fn render(frame: &mut Frame, dashboard: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, dashboard, chunks[0]);
    render_main(frame, dashboard, chunks[1]);
    render_footer(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let (status_str, status_color) = match dashboard.status {
        TrainingStatus::Running => ("RUNNING", Color::Green),
        TrainingStatus::Paused => ("PAUSED", Color::Yellow),
        TrainingStatus::Finished => ("FINISHED", Color::Cyan),
        TrainingStatus::Diverged => ("DIVERGED", Color::Red),
    };

    let games = match dashboard.max_games {
        Some(max) => format!("Games: {} (session {}/{})", dashboard.games_played, dashboard.session_games(), max),
        None => format!("Games: {}", dashboard.games_played),
    };

    let header_text = Line::from(vec![
        Span::styled(
            "Minesweeper self-play",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(games),
        Span::raw("  |  ["),
        Span::styled(
            status_str,
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("]"),
    ]);

    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn render_main(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    // Split into left (charts) and right (board + stats) panels
    let main_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_left_panel(frame, dashboard, main_cols[0]);
    render_right_panel(frame, dashboard, main_cols[1]);
}

fn render_left_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let mut constraints = vec![
        Constraint::Percentage(45), // Win rate chart
        Constraint::Percentage(35), // Error chart
        Constraint::Length(3),      // Game length sparkline
    ];
    if dashboard.max_games.is_some() {
        constraints.push(Constraint::Length(3)); // Progress gauge
    }
    let left_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_win_rate_chart(frame, dashboard, left_rows[0]);
    render_error_chart(frame, dashboard, left_rows[1]);
    render_game_length_sparkline(frame, dashboard, left_rows[2]);
    if let Some(progress) = dashboard.progress() {
        render_progress_gauge(frame, dashboard, progress, left_rows[3]);
    }
}

fn render_right_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_live_board(frame, dashboard, right_rows[0]);
    render_stats_panel(frame, dashboard, right_rows[1]);
}

fn render_win_rate_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let win_data: Vec<(f64, f64)> = dashboard.win_rate_history.iter().copied().collect();
    let (x_min, x_max) = x_bounds(&win_data);

    let mut datasets = vec![];
    if !win_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Win Rate")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Green))
                .data(&win_data),
        );
    }

    let x_labels = vec![
        Span::raw(format!("{}", x_min as usize)),
        Span::raw(format!("{}", x_max as usize)),
    ];
    let y_labels = vec![Span::raw("0%"), Span::raw("50%"), Span::raw("100%")];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Win Rate"))
        .x_axis(
            Axis::default()
                .title("Game")
                .labels(x_labels)
                .bounds([x_min, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("Rate")
                .labels(y_labels)
                .bounds([0.0, 1.0]),
        );

    frame.render_widget(chart, area);
}

fn render_error_chart(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let error_data: Vec<(f64, f64)> = dashboard.error_history.iter().copied().collect();
    let (x_min, x_max) = x_bounds(&error_data);

    let y_max = error_data.iter().map(|&(_, y)| y).fold(0.01_f64, f64::max);
    // Round up to nearest 0.01
    let y_max = ((y_max * 100.0).ceil() / 100.0).max(0.01);

    let mut datasets = vec![];
    if !error_data.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Error")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&error_data),
        );
    }

    let x_labels = vec![
        Span::raw(format!("{}", x_min as usize)),
        Span::raw(format!("{}", x_max as usize)),
    ];
    let y_labels = vec![Span::raw("0"), Span::raw(format!("{:.2}", y_max))];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Mean Squared Error"),
        )
        .x_axis(
            Axis::default()
                .title("Game")
                .labels(x_labels)
                .bounds([x_min, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("MSE")
                .labels(y_labels)
                .bounds([0.0, y_max]),
        );

    frame.render_widget(chart, area);
}

fn render_game_length_sparkline(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let data: Vec<u64> = dashboard.game_length_history.iter().copied().collect();

    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Game Length (avg: {:.1})",
            dashboard.avg_game_length
        )))
        .data(&data)
        .style(Style::default().fg(Color::Magenta));

    frame.render_widget(sparkline, area);
}

fn render_progress_gauge(frame: &mut Frame, dashboard: &DashboardState, progress: f64, area: Rect) {
    let label = format!(
        "{}/{} ({:.1}%)",
        dashboard.session_games(),
        dashboard.max_games.unwrap_or_default(),
        progress * 100.0
    );

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(progress.clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

/// Board on top; prediction and target grids side by side underneath.
fn render_live_board(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let title = match &dashboard.live {
        Some(tick) => format!("Live Game {} (move {})", tick.game_number, tick.move_number),
        None => "Live Game".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(tick) = &dashboard.live else {
        let placeholder = Paragraph::new("Waiting for first move...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(placeholder, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(tick.board.rows as u16 + 1),
            Constraint::Min(tick.board.rows as u16 + 1),
        ])
        .split(inner);
    board_widget::render_board_compact(frame, &tick.board, None, rows[0]);

    let grids = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let mut prediction = vec![Line::styled("prediction x1000", Style::default().fg(Color::White))];
    prediction.extend(board_widget::value_lines(
        &tick.prediction,
        tick.board.cols,
        Color::Magenta,
    ));
    frame.render_widget(Paragraph::new(prediction), grids[0]);

    let mut target = vec![Line::styled("target x1000", Style::default().fg(Color::White))];
    target.extend(board_widget::value_lines(
        &tick.target,
        tick.board.cols,
        Color::Green,
    ));
    frame.render_widget(Paragraph::new(target), grids[1]);
}

fn render_stats_panel(frame: &mut Frame, dashboard: &DashboardState, area: Rect) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::White));

    let mut lines = vec![
        Line::from(vec![
            label("Win Rate:     "),
            Span::styled(
                format!("{:.1}%", dashboard.win_rate * 100.0),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("Win/Loss:     "),
            Span::styled(
                format!("{}", dashboard.wins),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" / "),
            Span::styled(
                format!("{}", dashboard.losses),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            label("Error:        "),
            Span::raw(format!("{:.6}", dashboard.average_error)),
        ]),
        Line::from(vec![
            label("Avg Length:   "),
            Span::raw(format!("{:.1}", dashboard.avg_game_length)),
        ]),
        Line::from(vec![
            label("Restarts:     "),
            Span::raw(format!("{}", dashboard.forced_restarts)),
        ]),
    ];

    if dashboard.games_per_sec > 0.0 {
        lines.push(Line::from(vec![
            label("Games/sec:    "),
            Span::raw(format!("{:.2}", dashboard.games_per_sec)),
        ]));
    }

    if let Some(result) = dashboard.last_result {
        let (text, color) = match result {
            GameResult::Won => ("won", Color::Green),
            GameResult::Lost => ("lost", Color::Red),
            GameResult::Running => ("running", Color::White),
        };
        lines.push(Line::from(vec![
            label("Last Game:    "),
            Span::styled(text, Style::default().fg(color)),
        ]));
    }

    if let Some(ref save) = dashboard.last_save {
        lines.push(Line::from(vec![
            label("Last Save: "),
            Span::styled(save.clone(), Style::default().fg(Color::DarkGray)),
        ]));
    }

    if let Some(ref message) = dashboard.last_message {
        let color = if dashboard.status == TrainingStatus::Diverged {
            Color::Red
        } else {
            Color::Yellow
        };
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(color),
        )));
    }

    let stats = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Stats"));

    frame.render_widget(stats, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new("P: Pause/Resume  |  S: Save Parameters  |  Q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(footer, area);
}

/// Compute x-axis bounds from data points.
fn x_bounds(data: &[(f64, f64)]) -> (f64, f64) {
    match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0.max(first.0 + 1.0)),
        _ => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::dashboard_msg::{TickSnapshot, TrainingUpdate};
    use crate::game::{Game, Minefield};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_x_bounds() {
        assert_eq!(x_bounds(&[]), (0.0, 1.0));
        assert_eq!(x_bounds(&[(5.0, 0.1)]), (5.0, 6.0));
        assert_eq!(x_bounds(&[(5.0, 0.1), (20.0, 0.3)]), (5.0, 20.0));
    }

    #[test]
    fn test_render_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut dashboard = DashboardState::new(Some(10));
        terminal.draw(|f| render(f, &dashboard)).unwrap();

        let mut game = Game::with_layout(Minefield::from_mines(6, 6, &[(2, 2)]));
        game.make_guess(2, 2).unwrap();
        dashboard.apply_update(TrainingUpdate::Tick(TickSnapshot {
            board: game.snapshot(),
            prediction: vec![0.5; 36],
            target: vec![0.0; 36],
            game_number: 1,
            move_number: 1,
        }));
        dashboard.apply_update(TrainingUpdate::Diverged("training diverged".into()));
        terminal.draw(|f| render(f, &dashboard)).unwrap();
    }
}
