use rand::Rng;

pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_COLS: usize = 6;

/// Iterate over the in-bounds 8-neighbours of `(row, col)`, excluding the cell itself.
pub fn neighbors(
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let row_lo = row.saturating_sub(1);
    let row_hi = (row + 1).min(rows - 1);
    let col_lo = col.saturating_sub(1);
    let col_hi = (col + 1).min(cols - 1);

    (row_lo..=row_hi)
        .flat_map(move |r| (col_lo..=col_hi).map(move |c| (r, c)))
        .filter(move |&(r, c)| r != row || c != col)
}

/// Mine layout and adjacency counts for one game.
///
/// Cells are stored row-major; `index = row * cols + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minefield {
    rows: usize,
    cols: usize,
    mines: Vec<bool>,
    counts: Vec<u8>,
}

impl Minefield {
    /// Build a fixed layout with mines at the given coordinates.
    pub fn from_mines(rows: usize, cols: usize, mines: &[(usize, usize)]) -> Self {
        let mut mask = vec![false; rows * cols];
        for &(row, col) in mines {
            assert!(row < rows && col < cols, "mine ({row}, {col}) outside board");
            mask[row * cols + col] = true;
        }
        Self::from_mask(rows, cols, mask)
    }

    /// Draw every cell as a mine with probability `mine_probability`,
    /// redrawing until at least one mine exists.
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mine_probability: f64,
        rng: &mut R,
    ) -> Self {
        loop {
            let mask: Vec<bool> = (0..rows * cols)
                .map(|_| rng.random::<f64>() < mine_probability)
                .collect();
            if mask.iter().any(|&m| m) {
                return Self::from_mask(rows, cols, mask);
            }
        }
    }

    fn from_mask(rows: usize, cols: usize, mines: Vec<bool>) -> Self {
        let mut counts = vec![0u8; rows * cols];
        for row in 0..rows {
            for col in 0..cols {
                counts[row * cols + col] = neighbors(rows, cols, row, col)
                    .filter(|&(r, c)| mines[r * cols + c])
                    .count() as u8;
            }
        }
        Minefield {
            rows,
            cols,
            mines,
            counts,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_mine(&self, row: usize, col: usize) -> bool {
        self.mines[row * self.cols + col]
    }

    /// Number of mines among the 8 neighbours of a cell.
    pub fn adjacent_mines(&self, row: usize, col: usize) -> u8 {
        self.counts[row * self.cols + col]
    }

    /// A safe cell with no adjacent mines; the cascade spreads through these.
    pub fn is_empty_zero(&self, row: usize, col: usize) -> bool {
        !self.is_mine(row, col) && self.adjacent_mines(row, col) == 0
    }

    pub fn mine_count(&self) -> usize {
        self.mines.iter().filter(|&&m| m).count()
    }

    /// Reveal `(row, col)` into `visible` and cascade over zero regions.
    ///
    /// Every cell of the 3x3 block around the guess that is an empty zero
    /// seeds a flood fill that opens its connected zero region plus the
    /// region's numbered border. Returns the number of newly revealed cells.
    pub fn reveal(&self, row: usize, col: usize, visible: &mut [bool]) -> usize {
        let mut opened = 0;
        open_cell(row * self.cols + col, visible, &mut opened);
        if self.is_mine(row, col) {
            return opened;
        }

        let mut queued = vec![false; self.rows * self.cols];
        let mut worklist: Vec<(usize, usize)> = std::iter::once((row, col))
            .chain(neighbors(self.rows, self.cols, row, col))
            .filter(|&(r, c)| self.is_empty_zero(r, c))
            .collect();
        for &(r, c) in &worklist {
            queued[r * self.cols + c] = true;
        }

        while let Some((r, c)) = worklist.pop() {
            open_cell(r * self.cols + c, visible, &mut opened);
            for (nr, nc) in neighbors(self.rows, self.cols, r, c) {
                let idx = nr * self.cols + nc;
                open_cell(idx, visible, &mut opened);
                if !queued[idx] && self.is_empty_zero(nr, nc) {
                    queued[idx] = true;
                    worklist.push((nr, nc));
                }
            }
        }

        opened
    }
}

fn open_cell(idx: usize, visible: &mut [bool], opened: &mut usize) {
    if !visible[idx] {
        visible[idx] = true;
        *opened += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_neighbors_corner_and_center() {
        let corner: Vec<_> = neighbors(6, 6, 0, 0).collect();
        assert_eq!(corner, vec![(0, 1), (1, 0), (1, 1)]);

        let center: Vec<_> = neighbors(6, 6, 2, 2).collect();
        assert_eq!(center.len(), 8);
        assert!(!center.contains(&(2, 2)));
    }

    #[test]
    fn test_adjacent_counts() {
        let field = Minefield::from_mines(6, 6, &[(2, 2)]);
        assert_eq!(field.mine_count(), 1);
        for (r, c) in neighbors(6, 6, 2, 2) {
            assert_eq!(field.adjacent_mines(r, c), 1, "cell ({r}, {c})");
        }
        assert_eq!(field.adjacent_mines(0, 0), 0);
        assert_eq!(field.adjacent_mines(5, 5), 0);
        assert!(field.is_empty_zero(0, 0));
        assert!(!field.is_empty_zero(1, 1));
    }

    #[test]
    fn test_generate_has_at_least_one_mine() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            // Low probability forces the redraw path regularly.
            let field = Minefield::generate(3, 3, 0.02, &mut rng);
            assert!(field.mine_count() >= 1);
        }
    }

    #[test]
    fn test_reveal_cascades_zero_region() {
        let field = Minefield::from_mines(6, 6, &[(2, 2)]);
        let mut visible = vec![false; 36];
        let opened = field.reveal(0, 0, &mut visible);

        // Everything except the mine is connected to the zero region.
        assert_eq!(opened, 35);
        assert!(!visible[2 * 6 + 2]);
    }

    #[test]
    fn test_reveal_numbered_cell_next_to_zero_opens_region() {
        // Mines fence off the right side; (0, 1) is numbered but touches zeros.
        let field = Minefield::from_mines(3, 4, &[(0, 2), (1, 2), (2, 2)]);
        let mut visible = vec![false; 12];
        field.reveal(0, 1, &mut visible);

        assert!(visible[0]); // (0, 0) zero region opened through the neighbour
        assert!(visible[2 * 4]); // (2, 0)
        assert!(!visible[3]); // (0, 3) is beyond the mine wall
    }

    #[test]
    fn test_reveal_mine_only_opens_the_mine() {
        let field = Minefield::from_mines(6, 6, &[(2, 2)]);
        let mut visible = vec![false; 36];
        assert_eq!(field.reveal(2, 2, &mut visible), 1);
        assert_eq!(visible.iter().filter(|&&v| v).count(), 1);
    }
}
