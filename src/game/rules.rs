//! Rules engine: win, draw, and legality checks over a board.
//!
//! All functions here are pure and deterministic. Win detection scans a
//! fixed table of the 8 possible lines; `winner` and `winning_line` share
//! that table so the two can never disagree on the same board.

use super::types::{Board, Player};
use tracing::instrument;

/// The 8 lines that complete a game: rows, then columns, then diagonals.
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

/// Checks if there is a winner on the board.
///
/// Returns `Some(player)` if the player has three in a row,
/// `None` otherwise.
#[instrument]
pub fn winner(board: &Board) -> Option<Player> {
    for [a, b, c] in LINES {
        let mark = board.get(a);
        if mark.is_some() && mark == board.get(b) && mark == board.get(c) {
            return mark;
        }
    }
    None
}

/// Returns the indices of the completed line, if any.
///
/// Uses the same line enumeration order as [`winner`].
#[instrument]
pub fn winning_line(board: &Board) -> Option<[usize; 3]> {
    for line in LINES {
        let [a, b, c] = line;
        let mark = board.get(a);
        if mark.is_some() && mark == board.get(b) && mark == board.get(c) {
            return Some(line);
        }
    }
    None
}

/// Checks if the game is a draw: full board with no winner.
#[instrument]
pub fn is_draw(board: &Board) -> bool {
    winner(board).is_none() && board.is_full()
}

/// Returns all empty positions in ascending index order.
///
/// The ordering matters for reproducible bot behavior.
pub fn legal_moves(board: &Board) -> Vec<usize> {
    (0..9).filter(|&pos| board.is_empty(pos)).collect()
}

/// Checks if a move targets an in-range, empty cell.
pub fn is_legal_move(board: &Board, pos: usize) -> bool {
    pos < 9 && board.is_empty(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(marks: [Option<Player>; 9]) -> Board {
        let mut board = Board::new();
        for (pos, mark) in marks.into_iter().enumerate() {
            if let Some(player) = mark {
                board.set(pos, player);
            }
        }
        board
    }

    const X: Option<Player> = Some(Player::X);
    const O: Option<Player> = Some(Player::O);
    const E: Option<Player> = None;

    #[test]
    fn test_no_winner_empty_board() {
        let board = Board::new();
        assert_eq!(winner(&board), None);
        assert_eq!(winning_line(&board), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_from([X, X, X, O, O, E, E, E, E]);
        assert_eq!(winner(&board), Some(Player::X));
        assert_eq!(winning_line(&board), Some([0, 1, 2]));
    }

    #[test]
    fn test_winner_left_column() {
        let board = board_from([O, X, X, O, X, E, O, E, E]);
        assert_eq!(winner(&board), Some(Player::O));
        assert_eq!(winning_line(&board), Some([0, 3, 6]));
    }

    #[test]
    fn test_winner_diagonal() {
        let board = board_from([O, X, X, E, O, X, E, E, O]);
        assert_eq!(winner(&board), Some(Player::O));
        assert_eq!(winning_line(&board), Some([0, 4, 8]));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = board_from([O, O, X, E, X, E, X, E, E]);
        assert_eq!(winner(&board), Some(Player::X));
        assert_eq!(winning_line(&board), Some([2, 4, 6]));
    }

    #[test]
    fn test_no_winner_incomplete_line() {
        // Row 2 holds O,O,empty - not a completed line.
        let board = board_from([X, X, O, O, O, E, E, X, E]);
        assert_eq!(winner(&board), None);
        assert_eq!(winning_line(&board), None);
        assert!(!is_draw(&board));
    }

    #[test]
    fn test_draw_full_board_no_line() {
        let board = board_from([X, O, X, X, O, O, O, X, X]);
        assert_eq!(winner(&board), None);
        assert!(is_draw(&board));
    }

    #[test]
    fn test_not_draw_with_empty_cell() {
        let board = board_from([X, O, X, X, O, O, O, X, E]);
        assert!(!is_draw(&board));
    }

    #[test]
    fn test_not_draw_with_winner() {
        let board = board_from([X, X, X, O, O, X, O, X, O]);
        assert_eq!(winner(&board), Some(Player::X));
        assert!(!is_draw(&board));
    }

    #[test]
    fn test_legal_moves_ascending() {
        let board = board_from([X, E, O, E, X, E, E, E, O]);
        assert_eq!(legal_moves(&board), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_is_legal_move_bounds_and_occupancy() {
        let board = board_from([X, E, E, E, E, E, E, E, E]);
        assert!(!is_legal_move(&board, 0));
        assert!(is_legal_move(&board, 1));
        assert!(!is_legal_move(&board, 9));
        assert!(!is_legal_move(&board, usize::MAX));
    }
}
