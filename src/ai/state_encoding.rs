use crate::game::BoardView;

/// One-hot channels for adjacency counts 1..=8.
pub const COUNT_CHANNELS: usize = 8;

/// Visibility channel plus the count channels.
pub const INPUT_CHANNELS: usize = 1 + COUNT_CHANNELS;

/// Length of the encoded input vector for a `rows x cols` board.
pub fn input_size(rows: usize, cols: usize) -> usize {
    rows * cols * INPUT_CHANNELS
}

/// Encode the player-visible board into a fresh vector.
pub fn encode_board<V: BoardView + ?Sized>(view: &V) -> Vec<f64> {
    let mut data = vec![0.0; input_size(view.rows(), view.cols())];
    encode_board_into(view, &mut data);
    data
}

/// Encode the board into `data`, channel-major.
///
/// Channel 0: 1.0 where the cell is revealed
/// Channel n (1..=8): 1.0 where a revealed cell has exactly n adjacent mines
///
/// Hidden cells and revealed zeros leave every count channel at 0.
pub fn encode_board_into<V: BoardView + ?Sized>(view: &V, data: &mut [f64]) {
    let cells = view.cell_count();
    let cols = view.cols();
    assert_eq!(data.len(), cells * INPUT_CHANNELS, "input buffer size");

    data.fill(0.0);
    for idx in 0..cells {
        let (row, col) = (idx / cols, idx % cols);
        if !view.is_visible(row, col) {
            continue;
        }
        data[idx] = 1.0;
        let count = view.adjacent_mines(row, col) as usize;
        if (1..=COUNT_CHANNELS).contains(&count) {
            data[count * cells + idx] = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, Minefield};

    #[test]
    fn test_hidden_board_encodes_to_zeros() {
        let game = Game::with_layout(Minefield::from_mines(6, 6, &[(2, 2)]));
        let data = encode_board(&game);
        assert_eq!(data.len(), 6 * 6 * 9);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_revealed_cells_set_visibility_and_count_channels() {
        // 1x3 with the mine in the middle: both outer cells read "1".
        let mut game = Game::with_layout(Minefield::from_mines(1, 3, &[(0, 1)]));
        game.make_guess(0, 0).unwrap();
        let data = encode_board(&game);
        let cells = 3;

        assert_eq!(data[0], 1.0);
        assert_eq!(data[1], 0.0);
        assert_eq!(data[2], 0.0);
        assert_eq!(data[cells], 1.0); // channel 1, cell 0
        assert_eq!(data[cells + 2], 0.0); // hidden cell carries no count
        assert_eq!(data.iter().filter(|&&v| v == 1.0).count(), 2);
    }

    #[test]
    fn test_revealed_zero_has_only_visibility() {
        let mut game = Game::with_layout(Minefield::from_mines(6, 6, &[(5, 5)]));
        game.make_guess(0, 0).unwrap();
        let data = encode_board(&game);
        let cells = 36;

        assert_eq!(data[0], 1.0);
        for channel in 1..INPUT_CHANNELS {
            assert_eq!(data[channel * cells], 0.0, "channel {channel}");
        }
        // (4, 4) borders the mine and reads 1.
        assert_eq!(data[cells + 4 * 6 + 4], 1.0);
    }
}
