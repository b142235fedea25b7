//! In-memory session store: the authoritative home of game sessions.

use crate::error::GameError;
use crate::game::{Difficulty, GameMode, Player};
use crate::session::{GameSession, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

/// Read-only projection of a completed session for the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Session identifier.
    pub id: SessionId,
    /// Winning mark, or `None` for a draw.
    pub winner: Option<Player>,
    /// Play mode.
    pub mode: GameMode,
    /// Bot difficulty the session was created with.
    pub ai_difficulty: Difficulty,
    /// Number of plies played.
    pub move_count: usize,
    /// When the session ended.
    pub completed_at: DateTime<Utc>,
}

/// Holds the canonical copy of every session, keyed by identifier.
///
/// Explicitly constructed and cheaply clonable; clones share the same
/// underlying map, so each test can build its own isolated store.
/// Sessions are never evicted: they accumulate for the history view for
/// the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, GameSession>>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Inserts a new session under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Conflict`] if the identifier is already
    /// taken. Identifier generation makes that vanishingly unlikely, but
    /// an existing session is never overwritten.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn create(&self, session: GameSession) -> Result<GameSession, GameError> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");

        if sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Session id collision");
            return Err(GameError::Conflict {
                id: session.id.clone(),
            });
        }

        sessions.insert(session.id.clone(), session.clone());
        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Looks up a session by identifier.
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: &str) -> Option<GameSession> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        let session = sessions.get(id).cloned();
        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }
        session
    }

    /// Replaces the stored session wholesale (last write wins).
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn update(&self, session: GameSession) -> GameSession {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions.insert(session.id.clone(), session.clone());
        debug!("Session updated");
        session
    }

    /// Returns every completed session projected to a [`HistoryEntry`],
    /// most recently completed first.
    ///
    /// Equal completion timestamps break by identifier so the order is
    /// stable within one snapshot.
    #[instrument(skip(self))]
    pub fn list_completed(&self) -> Vec<HistoryEntry> {
        let sessions = self.sessions.lock().expect("session map poisoned");

        let mut entries: Vec<HistoryEntry> = sessions
            .values()
            .filter_map(|session| {
                let completed_at = session.completed_at?;
                Some(HistoryEntry {
                    id: session.id.clone(),
                    winner: session.winner,
                    mode: session.mode,
                    ai_difficulty: session.ai_difficulty,
                    move_count: session.moves.len(),
                    completed_at,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        debug!(count = entries.len(), "Listed completed sessions");
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameStatus;

    fn completed_session(status: GameStatus, winner: Option<Player>) -> GameSession {
        let mut session = GameSession::new(GameMode::Pvp, None);
        session.status = status;
        session.winner = winner;
        session.completed_at = Some(Utc::now());
        session
    }

    #[test]
    fn test_create_then_find() {
        let store = SessionStore::new();
        let session = store.create(GameSession::new(GameMode::Pvp, None)).unwrap();
        let found = store.find_by_id(&session.id).unwrap();
        assert_eq!(found, session);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let store = SessionStore::new();
        assert!(store.find_by_id("no-such-id").is_none());
    }

    #[test]
    fn test_create_duplicate_conflicts() {
        let store = SessionStore::new();
        let session = store.create(GameSession::new(GameMode::Pvp, None)).unwrap();
        let err = store.create(session.clone()).unwrap_err();
        assert_eq!(err, GameError::Conflict { id: session.id });
    }

    #[test]
    fn test_update_replaces_wholesale() {
        let store = SessionStore::new();
        let mut session = store.create(GameSession::new(GameMode::Pvp, None)).unwrap();
        session.apply_ply(4).unwrap();
        store.update(session.clone());
        assert_eq!(store.find_by_id(&session.id).unwrap(), session);
    }

    #[test]
    fn test_list_completed_filters_and_orders() {
        let store = SessionStore::new();

        let in_progress = GameSession::new(GameMode::Pvp, None);
        store.create(in_progress.clone()).unwrap();

        let mut older = completed_session(GameStatus::Won, Some(Player::X));
        older.completed_at = Some(Utc::now() - chrono::Duration::seconds(60));
        store.create(older.clone()).unwrap();

        let newer = completed_session(GameStatus::Draw, None);
        store.create(newer.clone()).unwrap();

        let history = store.list_completed();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer.id);
        assert_eq!(history[0].winner, None);
        assert_eq!(history[1].id, older.id);
        assert_eq!(history[1].winner, Some(Player::X));
        assert!(!history.iter().any(|e| e.id == in_progress.id));
    }
}
