//! Game session aggregate and single-ply application.

use crate::error::GameError;
use crate::game::rules;
use crate::game::{Board, Difficulty, GameMode, GameStatus, Move, Player};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Unique identifier for a game session.
pub type SessionId = String;

/// One played-or-playing game, owned by the session store.
///
/// The board is cached directly for O(1) access but is always exactly the
/// replay of `moves` onto an empty board. Once `status` leaves
/// `InProgress` no further plies are accepted and `completed_at` never
/// changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// Session identifier.
    pub id: SessionId,
    /// Current board state.
    pub board: Board,
    /// Mark whose turn it is.
    pub current_player: Player,
    /// Game status.
    pub status: GameStatus,
    /// Winning mark, if any.
    pub winner: Option<Player>,
    /// The three indices that completed the win, if any.
    pub winning_line: Option<[usize; 3]>,
    /// Play mode.
    pub mode: GameMode,
    /// Bot difficulty; meaningful only in AI mode.
    pub ai_difficulty: Difficulty,
    /// Append-only move log.
    pub moves: Vec<Move>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session reached a terminal state; set exactly once.
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameSession {
    /// Creates a fresh in-progress session with an empty board.
    ///
    /// X is always the starting mover. The difficulty defaults to hard
    /// when not specified.
    #[instrument]
    pub fn new(mode: GameMode, difficulty: Option<Difficulty>) -> Self {
        let id = generate_id();
        debug!(session_id = %id, ?mode, "Creating new game session");
        Self {
            id,
            board: Board::new(),
            current_player: Player::X,
            status: GameStatus::InProgress,
            winner: None,
            winning_line: None,
            mode,
            ai_difficulty: difficulty.unwrap_or(Difficulty::Hard),
            moves: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Checks whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    /// Applies one ply for the current player.
    ///
    /// Places the mark, appends the move record, and evaluates terminal
    /// conditions: a completed line transitions to won (recording winner,
    /// line, and completion time), a full board to draw, otherwise the
    /// turn flips to the other mark.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the session already ended,
    /// or [`GameError::IllegalMove`] for an out-of-range or occupied
    /// position.
    #[instrument(skip(self), fields(session_id = %self.id, player = ?self.current_player))]
    pub fn apply_ply(&mut self, position: usize) -> Result<(), GameError> {
        if self.is_terminal() {
            return Err(GameError::InvalidState {
                id: self.id.clone(),
            });
        }
        if !rules::is_legal_move(&self.board, position) {
            return Err(GameError::IllegalMove { position });
        }

        let player = self.current_player;
        self.board.set(position, player);
        self.moves.push(Move {
            position,
            player,
            timestamp: Utc::now(),
        });

        if let Some(winner) = rules::winner(&self.board) {
            self.status = GameStatus::Won;
            self.winner = Some(winner);
            self.winning_line = rules::winning_line(&self.board);
            self.completed_at = Some(Utc::now());
        } else if self.board.is_full() {
            self.status = GameStatus::Draw;
            self.completed_at = Some(Utc::now());
        } else {
            self.current_player = player.opponent();
        }

        debug!(position, status = ?self.status, "Ply applied");
        Ok(())
    }

    /// Rebuilds the board by replaying the move log from scratch.
    ///
    /// Always equal to the cached `board`; exists so callers (and tests)
    /// can verify that invariant.
    pub fn replayed_board(&self) -> Board {
        let mut board = Board::new();
        for mv in &self.moves {
            board.set(mv.position, mv.player);
        }
        board
    }
}

/// Generates a collision-resistant session identifier: the creation time
/// in base-36 milliseconds plus a random alphanumeric suffix.
fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}
