//! Error taxonomy for game operations.

use derive_more::{Display, Error};

/// Errors surfaced by session operations.
///
/// Each variant is a distinct, caller-visible condition; none are ever
/// coerced into another or silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// No session exists under the given identifier.
    #[display("Game not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A move was submitted to a session that already ended.
    #[display("Game {id} is already finished")]
    InvalidState {
        /// The terminal session's identifier.
        id: String,
    },

    /// The move targets an out-of-range or occupied cell.
    #[display("Illegal move: position {position} is out of range or occupied")]
    IllegalMove {
        /// The rejected position.
        position: usize,
    },

    /// A session identifier collision on creation.
    #[display("Game already exists: {id}")]
    Conflict {
        /// The colliding identifier.
        id: String,
    },
}
