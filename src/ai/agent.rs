use super::networks::{FeedForwardNetwork, NetworkConfig};
use super::state_encoding::{encode_board_into, input_size, INPUT_CHANNELS};
use crate::error::NetworkError;
use crate::game::BoardView;

/// Which cells the agent may pick from the network's scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Hidden margin squares only; every hidden cell on an untouched board.
    #[default]
    Frontier,
    /// Plain argmax over every cell, revealed or not.
    Unrestricted,
}

/// Pick the highest-scoring allowed cell. Ties go to the first index in
/// row-major order. Returns `None` when no cell is allowed.
pub fn select_cell<V: BoardView + ?Sized>(
    scores: &[f64],
    view: &V,
    policy: SelectionPolicy,
) -> Option<usize> {
    let cols = view.cols();
    let untouched = view.visible_count() == 0;
    let allowed = |idx: usize| {
        let (row, col) = (idx / cols, idx % cols);
        match policy {
            SelectionPolicy::Unrestricted => true,
            SelectionPolicy::Frontier if untouched => true,
            SelectionPolicy::Frontier => view.is_margin(row, col),
        }
    };

    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate().take(view.cell_count()) {
        if !allowed(idx) {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Network-backed player: encodes the visible board, runs a forward pass,
/// and picks a cell.
///
/// Only a [`BoardView`] is ever handed to the agent, so predictions never
/// depend on mine positions.
pub struct NetworkAgent {
    network: FeedForwardNetwork,
    policy: SelectionPolicy,
    inputs: Vec<f64>,
    prediction: Vec<f64>,
}

impl NetworkAgent {
    pub fn new(network: FeedForwardNetwork, policy: SelectionPolicy) -> Self {
        NetworkAgent {
            inputs: vec![0.0; network.input_size()],
            prediction: vec![0.0; network.output_size()],
            network,
            policy,
        }
    }

    /// Fresh network sized for a `rows x cols` board.
    pub fn for_board(
        rows: usize,
        cols: usize,
        config: &NetworkConfig,
        policy: SelectionPolicy,
    ) -> Result<Self, NetworkError> {
        let network = FeedForwardNetwork::from_config(input_size(rows, cols), rows * cols, config)?;
        Ok(Self::new(network, policy))
    }

    /// Forward the board and return the chosen `(row, col)`.
    ///
    /// The network's scratch buffers hold this pass afterwards, so a
    /// backpropagation call may follow directly.
    pub fn select<V: BoardView + ?Sized>(
        &mut self,
        view: &V,
    ) -> Result<Option<(usize, usize)>, NetworkError> {
        let cells = view.cell_count();
        if self.inputs.len() != cells * INPUT_CHANNELS {
            return Err(NetworkError::InputLength {
                expected: self.inputs.len(),
                found: cells * INPUT_CHANNELS,
            });
        }
        encode_board_into(view, &mut self.inputs);
        let scores = self.network.forward(&self.inputs)?;
        self.prediction.copy_from_slice(scores);

        let cols = view.cols();
        Ok(select_cell(&self.prediction, view, self.policy).map(|idx| (idx / cols, idx % cols)))
    }

    /// Scores from the most recent [`select`](Self::select).
    pub fn prediction(&self) -> &[f64] {
        &self.prediction
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut FeedForwardNetwork {
        &mut self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, Minefield};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn opened_corner_game() -> Game {
        // Mine wall down column 2; opening (0, 0) reveals columns 0 and 1.
        let mut game = Game::with_layout(Minefield::from_mines(3, 4, &[(0, 2), (1, 2), (2, 2)]));
        game.make_guess(0, 0).unwrap();
        game
    }

    #[test]
    fn test_unrestricted_is_plain_argmax() {
        let game = opened_corner_game();
        let mut scores = vec![0.1; 12];
        scores[0] = 0.9; // revealed
        assert_eq!(select_cell(&scores, &game, SelectionPolicy::Unrestricted), Some(0));
    }

    #[test]
    fn test_frontier_skips_revealed_and_isolated_cells() {
        let game = opened_corner_game();
        let mut scores = vec![0.1; 12];
        scores[0] = 0.9; // revealed
        scores[3] = 0.8; // hidden but not on the margin
        scores[6] = 0.5; // (1, 2): margin
        assert_eq!(select_cell(&scores, &game, SelectionPolicy::Frontier), Some(6));
    }

    #[test]
    fn test_frontier_on_untouched_board_allows_everything_hidden() {
        let game = Game::with_layout(Minefield::from_mines(3, 3, &[(1, 1)]));
        let mut scores = vec![0.2; 9];
        scores[8] = 0.7;
        assert_eq!(select_cell(&scores, &game, SelectionPolicy::Frontier), Some(8));
    }

    #[test]
    fn test_ties_break_to_first_index() {
        let game = Game::with_layout(Minefield::from_mines(2, 2, &[(1, 1)]));
        let scores = vec![0.5; 4];
        assert_eq!(select_cell(&scores, &game, SelectionPolicy::Unrestricted), Some(0));
    }

    #[test]
    fn test_agent_select_records_prediction() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = FeedForwardNetwork::with_rng(
            input_size(3, 4),
            12,
            1,
            5,
            crate::ai::networks::Activation::Sigmoid,
            &mut rng,
        )
        .unwrap();
        let mut agent = NetworkAgent::new(network, SelectionPolicy::Frontier);
        let game = opened_corner_game();

        let (row, col) = agent.select(&game).unwrap().unwrap();
        assert!(game.is_margin(row, col));
        assert_eq!(agent.prediction().len(), 12);
        assert!(agent.prediction().iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_agent_rejects_board_of_wrong_size() {
        let mut agent =
            NetworkAgent::for_board(2, 2, &NetworkConfig::default(), SelectionPolicy::Frontier)
                .unwrap();
        let game = opened_corner_game();
        assert!(matches!(
            agent.select(&game),
            Err(NetworkError::InputLength { .. })
        ));
    }
}
