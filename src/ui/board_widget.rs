use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::game::{BoardSnapshot, BoardView, GameResult};

fn count_color(count: u8) -> Color {
    match count {
        1 => Color::Blue,
        2 => Color::Green,
        3 => Color::Red,
        4 => Color::Magenta,
        5 => Color::Yellow,
        6 => Color::Cyan,
        _ => Color::White,
    }
}

/// Symbol and style of one cell as a player would see it.
fn cell_span(board: &BoardSnapshot, row: usize, col: usize) -> (String, Style) {
    let visible = board.is_visible(row, col);
    if board.shows_mine(row, col) {
        let exploded = visible && board.result == GameResult::Lost;
        let color = if exploded { Color::Red } else { Color::LightRed };
        return (" * ".to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD));
    }
    if !visible {
        return (" \u{25a0} ".to_string(), Style::default().fg(Color::DarkGray));
    }
    match board.adjacent_mines(row, col) {
        0 => (" . ".to_string(), Style::default().fg(Color::Gray)),
        n => (format!(" {n} "), Style::default().fg(count_color(n))),
    }
}

/// Board lines with an optional highlighted cell.
pub fn board_lines(board: &BoardSnapshot, cursor: Option<(usize, usize)>) -> Vec<Line<'static>> {
    (0..board.rows)
        .map(|row| {
            let spans: Vec<Span> = (0..board.cols)
                .map(|col| {
                    let (symbol, mut style) = cell_span(board, row, col);
                    if cursor == Some((row, col)) {
                        style = style.bg(Color::Cyan).fg(Color::Black);
                    } else if board.last_move == Some((row, col)) {
                        style = style.add_modifier(Modifier::UNDERLINED);
                    }
                    Span::styled(symbol, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Render a compact board (no borders) into the given area.
pub fn render_board_compact(
    frame: &mut Frame,
    board: &BoardSnapshot,
    cursor: Option<(usize, usize)>,
    area: Rect,
) {
    frame.render_widget(Paragraph::new(board_lines(board, cursor)), area);
}

/// Per-cell values scaled by 1000 and rounded, laid out like the board.
pub fn value_lines(values: &[f64], cols: usize, color: Color) -> Vec<Line<'static>> {
    if cols == 0 {
        return Vec::new();
    }
    values
        .chunks(cols)
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|v| {
                    Span::styled(
                        format!("{:>5}", (v * 1000.0).round() as i64),
                        Style::default().fg(color),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, Minefield};

    #[test]
    fn test_board_lines_shape() {
        let game = Game::with_layout(Minefield::from_mines(3, 4, &[(1, 1)]));
        let lines = board_lines(&game.snapshot(), Some((0, 0)));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.spans.len() == 4));
    }

    #[test]
    fn test_revealed_count_and_mine_symbols() {
        let mut game = Game::with_layout(Minefield::from_mines(1, 3, &[(0, 1)]));
        game.make_guess(0, 0).unwrap();
        let running = game.snapshot();
        assert_eq!(cell_span(&running, 0, 0).0, " 1 ");
        assert_eq!(cell_span(&running, 0, 1).0, " \u{25a0} ");

        game.make_guess(0, 1).unwrap();
        let lost = game.snapshot();
        assert_eq!(cell_span(&lost, 0, 1).0, " * ");
    }

    #[test]
    fn test_value_lines_scale_by_thousand() {
        let lines = value_lines(&[0.5, 0.0, 0.1234, 1.0], 2, Color::Green);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "  500");
        assert_eq!(lines[1].spans[0].content, "  123");
        assert_eq!(lines[1].spans[1].content, " 1000");
    }
}
