//! 3x3 grid and winning-line scan.

use xoxo_proto::{BOARD_SIZE, Cell, Cells, Seat, empty_cells};

/// The eight winning lines, in scan order: rows top to bottom, columns left
/// to right, the main diagonal, then the anti-diagonal (bottom-left to
/// top-right).
pub const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

/// Board cells. Cells only go from empty to taken; a reset builds a new board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Cells,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self { cells: empty_cells() }
    }

    /// Raw cells, indexed `[row][col]`.
    #[must_use]
    pub fn cells(&self) -> &Cells {
        &self.cells
    }

    /// Cell at 0-based coordinates. `None` off the board.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Claim a cell. Caller has already checked bounds and emptiness.
    pub(crate) fn claim(&mut self, row: usize, col: usize, seat: Seat) {
        debug_assert!(self.cells[row][col].is_empty());
        self.cells[row][col] = Cell::Taken(seat);
    }

    /// Number of taken cells.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| !cell.is_empty()).count()
    }

    /// Every cell is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.filled() == BOARD_SIZE * BOARD_SIZE
    }

    /// First seat (player one before player two) owning a complete line.
    ///
    /// Scan stops at the first match; no further tie-break is applied.
    #[must_use]
    pub fn winner(&self) -> Option<Seat> {
        [Seat::One, Seat::Two].into_iter().find(|&seat| {
            LINES
                .iter()
                .any(|line| line.iter().all(|&(r, c)| self.cells[r][c] == Cell::Taken(seat)))
        })
    }

    /// Empty cells as 0-based `(row, col)`, row-major.
    #[must_use]
    pub fn available(&self) -> Vec<(usize, usize)> {
        (0..BOARD_SIZE * BOARD_SIZE)
            .map(|i| (i / BOARD_SIZE, i % BOARD_SIZE))
            .filter(|&(row, col)| self.cells[row][col].is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(rows: [&str; 3]) -> Board {
        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, mark) in row.chars().enumerate() {
                match mark {
                    'O' => board.claim(r, c, Seat::One),
                    'X' => board.claim(r, c, Seat::Two),
                    _ => {},
                }
            }
        }
        board
    }

    #[test]
    fn every_line_wins() {
        for line in LINES {
            let mut board = Board::new();
            for (r, c) in line {
                board.claim(r, c, Seat::Two);
            }
            assert_eq!(board.winner(), Some(Seat::Two), "line {line:?}");
        }
    }

    #[test]
    fn anti_diagonal_wins() {
        let board = board_from(["..O", ".O.", "O.."]);
        assert_eq!(board.winner(), Some(Seat::One));
    }

    #[test]
    fn player_one_scanned_first() {
        // Not reachable through legal play, but pins the scan order.
        let board = board_from(["XXX", "OOO", "..."]);
        assert_eq!(board.winner(), Some(Seat::One));
    }

    #[test]
    fn full_board_without_line_has_no_winner() {
        let board = board_from(["OXO", "OXX", "XOO"]);
        assert!(board.is_full());
        assert_eq!(board.winner(), None);
        assert!(board.available().is_empty());
    }
}
