use super::models::{Board, Cell, Symbol};

/// Decides whether a board holds a winning arrangement.
pub trait WinRule: Send + Sync {
    fn winner(&self, board: &Board) -> Option<Symbol>;
}

/// Classic three in a row on the 3x3 board.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeInARow;

impl ThreeInARow {
    pub const LINES: [[usize; 3]; 8] = [
        // Rows
        [0, 1, 2],
        [3, 4, 5],
        [6, 7, 8],
        // Columns
        [0, 3, 6],
        [1, 4, 7],
        [2, 5, 8],
        // Diagonals
        [0, 4, 8],
        [2, 4, 6],
    ];
}

impl WinRule for ThreeInARow {
    fn winner(&self, board: &Board) -> Option<Symbol> {
        let cells = board.cells();
        Self::LINES.iter().find_map(|&[a, b, c]| match cells[a] {
            Cell::Taken(symbol) if cells[b] == cells[a] && cells[c] == cells[a] => Some(symbol),
            _ => None,
        })
    }
}
