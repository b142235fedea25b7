//! Oxo Server - networked tic-tac-toe with live updates
//!
//! The server owns authoritative game state, validates moves, computes
//! bot replies, and pushes full-session snapshots to watchers.
//!
//! # Architecture
//!
//! - **Game core**: rules engine and minimax bot (`game`)
//! - **Session**: the game aggregate and its move log (`session`)
//! - **Store**: in-memory keyed session collection (`store`)
//! - **Events**: per-session publish/subscribe (`events`)
//! - **Service**: the move-application orchestrator (`service`)
//! - **Http**: axum REST + SSE transport (`http`)
//!
//! # Example
//!
//! ```
//! use oxo_server::{GameMode, GameService};
//!
//! let service = GameService::new();
//! let session = service.create_session(GameMode::Ai, None).unwrap();
//! let session = service.apply_move(&session.id, 4).unwrap();
//! assert_eq!(session.moves.len(), 2); // human ply plus the bot's reply
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod error;
mod events;
mod game;
mod http;
mod service;
mod session;
mod store;

// Crate-level exports - Game core
pub use game::{Board, Difficulty, GameMode, GameStatus, Move, Player, bot, rules};

// Crate-level exports - Errors
pub use error::GameError;

// Crate-level exports - Sessions and storage
pub use session::{GameSession, SessionId};
pub use store::{HistoryEntry, SessionStore};

// Crate-level exports - Events
pub use events::{EventBus, SnapshotCallback, Subscription};

// Crate-level exports - Orchestration and transport
pub use http::{CreateGameRequest, MakeMoveRequest, router};
pub use service::GameService;
