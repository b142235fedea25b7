//! Core domain types for tic-tac-toe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player mark in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Player X (goes first).
    X,
    /// Player O (goes second; the bot in AI mode).
    O,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

/// 3x3 tic-tac-toe board.
///
/// Cells are stored in row-major order (0-8): 0,1,2 is the top row,
/// 0,3,6 the left column, 0,4,8 and 2,4,6 the diagonals. Serializes as
/// a 9-element array of `"X"`, `"O"`, or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Player>; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self { cells: [None; 9] }
    }

    /// Gets the cell at the given position (0-8).
    pub fn get(&self, pos: usize) -> Option<Player> {
        self.cells.get(pos).copied().flatten()
    }

    /// Places a mark at the given position.
    ///
    /// Out-of-range positions are ignored; callers validate with
    /// [`is_legal_move`](crate::game::rules::is_legal_move) first.
    pub fn set(&mut self, pos: usize, player: Player) {
        if let Some(cell) = self.cells.get_mut(pos) {
            *cell = Some(player);
        }
    }

    /// Clears the cell at the given position.
    ///
    /// Only used by the bot search to undo speculative plies.
    pub(crate) fn clear(&mut self, pos: usize) {
        if let Some(cell) = self.cells.get_mut(pos) {
            *cell = None;
        }
    }

    /// Checks if the cell at the given position is empty.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.cells.get(pos), Some(None))
    }

    /// Checks if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Option<Player>; 9] {
        &self.cells
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.cells[pos] {
                    None => ".".to_string(),
                    Some(Player::X) => "X".to_string(),
                    Some(Player::O) => "O".to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Play mode for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Two human players.
    Pvp,
    /// One human (X) against the bot (O).
    Ai,
}

/// Bot difficulty, meaningful only in [`GameMode::Ai`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Uniformly random legal moves.
    Easy,
    /// Full-depth minimax with alpha-beta pruning; unbeatable.
    Hard,
}

/// Current status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Game is ongoing.
    #[serde(rename = "playing")]
    InProgress,
    /// Game ended in a win.
    Won,
    /// Game ended in a draw.
    Draw,
}

/// One logged ply: who played where, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Board position (0-8).
    pub position: usize,
    /// Mark that was placed.
    pub player: Player,
    /// Wall-clock time the ply was applied.
    pub timestamp: DateTime<Utc>,
}
