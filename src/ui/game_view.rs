use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::board_widget::board_lines;
use crate::game::{BoardSnapshot, BoardView, GameResult};

pub fn render(
    frame: &mut Frame,
    board: &BoardSnapshot,
    cursor: (usize, usize),
    message: &Option<String>,
    hints_available: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                     // Header
            Constraint::Min(board.rows as u16 + 2),    // Board
            Constraint::Length(3),                     // Message
            Constraint::Length(3),                     // Controls
        ])
        .split(frame.area());

    render_header(frame, board, chunks[0]);
    render_board(frame, board, cursor, chunks[1]);
    render_message(frame, message, chunks[2]);
    render_controls(frame, hints_available, chunks[3]);
}

fn render_header(frame: &mut Frame, board: &BoardSnapshot, area: Rect) {
    let (status, color) = match board.result() {
        GameResult::Running => (
            format!(
                "Revealed {}/{}",
                board.visible_count(),
                board.cell_count()
            ),
            Color::White,
        ),
        GameResult::Won => ("You cleared the field!".to_string(), Color::Green),
        GameResult::Lost => ("Boom. Game over.".to_string(), Color::Red),
    };

    let header = Paragraph::new(status)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Minesweeper"));

    frame.render_widget(header, area);
}

fn render_board(frame: &mut Frame, board: &BoardSnapshot, cursor: (usize, usize), area: Rect) {
    let width = board.cols as u16 * 3 + 2;
    let mut lines = vec![Line::from(format!("╔{}╗", "═".repeat(width as usize - 2)))];
    for line in board_lines(board, Some(cursor)) {
        let mut spans = vec![Span::raw("║")];
        spans.extend(line.spans);
        spans.push(Span::raw("║"));
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(format!("╚{}╝", "═".repeat(width as usize - 2))));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_message(frame: &mut Frame, message: &Option<String>, area: Rect) {
    let text = message.as_deref().unwrap_or("");
    let msg_widget = Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, hints_available: bool, area: Rect) {
    let mut text = String::from("Arrows: Move  |  Enter/Space: Reveal  |  R: Restart  |  Q: Quit");
    if hints_available {
        text.push_str("  |  H: Hint");
    }

    let controls = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}
