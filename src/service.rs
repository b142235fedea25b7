//! Session orchestrator: the move-application protocol.
//!
//! [`GameService`] ties the store, the rules engine, the bot, and the
//! event bus together. Every mutation of a session goes through
//! [`GameService::apply_move`], which holds a per-session lock around the
//! whole read-modify-write so concurrent moves on one session cannot be
//! lost.

use crate::error::GameError;
use crate::events::{EventBus, Subscription};
use crate::game::{Difficulty, GameMode, Player, bot};
use crate::session::{GameSession, SessionId};
use crate::store::{HistoryEntry, SessionStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// The mark the bot plays in AI mode. The human always starts as X.
const BOT_MARK: Player = Player::O;

/// Orchestrates game sessions: creation, move application, history, and
/// live updates.
///
/// Cheaply clonable; clones share the same store, bus, and lock map, so
/// one service value can be handed to every request handler.
#[derive(Debug, Clone)]
pub struct GameService {
    store: SessionStore,
    events: EventBus,
    locks: Arc<Mutex<HashMap<SessionId, Arc<Mutex<()>>>>>,
}

impl GameService {
    /// Creates a service with a fresh store and bus.
    #[instrument]
    pub fn new() -> Self {
        Self::with_parts(SessionStore::new(), EventBus::new())
    }

    /// Creates a service over an existing store and bus.
    pub fn with_parts(store: SessionStore, events: EventBus) -> Self {
        Self {
            store,
            events,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Returns the event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Builds a fresh session and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Conflict`] on an identifier collision.
    #[instrument(skip(self))]
    pub fn create_session(
        &self,
        mode: GameMode,
        difficulty: Option<Difficulty>,
    ) -> Result<GameSession, GameError> {
        let session = GameSession::new(mode, difficulty);
        let session = self.store.create(session)?;
        info!(session_id = %session.id, ?mode, "Session created");
        Ok(session)
    }

    /// Looks up a session by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] if no session exists under `id`.
    #[instrument(skip(self))]
    pub fn get_session(&self, id: &str) -> Result<GameSession, GameError> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| GameError::NotFound { id: id.to_string() })
    }

    /// Applies a move for the current player and, in AI mode, the bot's
    /// immediate reply.
    ///
    /// The whole operation is atomic from the caller's perspective: the
    /// session is written back to the store exactly once and published
    /// exactly once, after both plies. Watchers therefore never observe a
    /// human move without the bot's answer.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] for an unknown session,
    /// [`GameError::InvalidState`] if the session already ended, or
    /// [`GameError::IllegalMove`] for an out-of-range or occupied cell.
    #[instrument(skip(self))]
    pub fn apply_move(&self, id: &str, position: usize) -> Result<GameSession, GameError> {
        // Reject unknown ids before taking a per-session lock so bogus
        // identifiers never allocate lock map entries.
        if self.store.find_by_id(id).is_none() {
            return Err(GameError::NotFound { id: id.to_string() });
        }

        let lock = self.session_lock(id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self
            .store
            .find_by_id(id)
            .ok_or_else(|| GameError::NotFound { id: id.to_string() })?;

        session.apply_ply(position)?;

        if !session.is_terminal()
            && session.mode == GameMode::Ai
            && session.current_player == BOT_MARK
        {
            let reply = match session.ai_difficulty {
                Difficulty::Hard => bot::best_move(&session.board, BOT_MARK),
                Difficulty::Easy => bot::random_move(&session.board),
            };
            debug!(session_id = %session.id, reply, "Bot replying");
            session.apply_ply(reply)?;
        }

        let session = self.store.update(session);
        self.events.publish(id, &session);

        info!(
            session_id = %session.id,
            position,
            status = ?session.status,
            "Move applied"
        );
        Ok(session)
    }

    /// Returns completed sessions, most recent first.
    #[instrument(skip(self))]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.list_completed()
    }

    /// Subscribes a snapshot callback to a session's updates.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFound`] if no session exists under `id`.
    pub fn subscribe<F>(&self, id: &str, callback: F) -> Result<Subscription, GameError>
    where
        F: Fn(&GameSession) -> bool + Send + Sync + 'static,
    {
        if self.store.find_by_id(id).is_none() {
            return Err(GameError::NotFound { id: id.to_string() });
        }
        Ok(self.events.subscribe(id, callback))
    }

    fn session_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        Arc::clone(locks.entry(id.to_string()).or_default())
    }
}

impl Default for GameService {
    fn default() -> Self {
        Self::new()
    }
}
