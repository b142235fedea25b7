//! Per-session publish/subscribe for live game updates.
//!
//! In-process only: watchers register a callback for a session id and
//! receive the full session snapshot on every publish. The bus never owns
//! session data; it relays whatever snapshot the publisher hands it.

use crate::session::{GameSession, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Snapshot callback. Returns `false` when the downstream consumer is
/// gone (e.g. a closed channel), which unsubscribes it.
pub type SnapshotCallback = Arc<dyn Fn(&GameSession) -> bool + Send + Sync>;

/// A subscriber's callback lives in a lockable slot. Delivery invokes
/// the callback under the slot lock and unsubscription clears the slot
/// under the same lock, so once `unsubscribe` returns the callback can
/// never fire again, even for a publish already in flight.
type CallbackSlot = Arc<Mutex<Option<SnapshotCallback>>>;

struct Subscriber {
    token: u64,
    slot: CallbackSlot,
}

/// Per-session event bus.
///
/// Cheaply clonable; clones share the same subscriber registry.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<HashMap<SessionId, Vec<Subscriber>>>>,
    next_token: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for the given session id.
    ///
    /// The returned [`Subscription`] unsubscribes when dropped, so a
    /// disconnecting watcher cleans itself up; dropping the last
    /// subscriber for a session frees its per-session set.
    pub fn subscribe<F>(&self, session_id: &str, callback: F) -> Subscription
    where
        F: Fn(&GameSession) -> bool + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(Arc::new(callback) as SnapshotCallback)));
        let mut subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        subscribers
            .entry(session_id.to_string())
            .or_default()
            .push(Subscriber {
                token,
                slot: Arc::clone(&slot),
            });
        debug!(session_id, token, "Subscriber registered");

        Subscription {
            bus: self.clone(),
            session_id: session_id.to_string(),
            token,
            slot,
        }
    }

    /// Delivers a snapshot to every subscriber of the session, in
    /// registration order.
    ///
    /// A callback reporting failure is removed so it cannot block
    /// delivery to the remaining subscribers on this or later publishes.
    /// A subscriber unsubscribed while a publish is in flight is skipped:
    /// each invocation runs under the subscriber's slot lock, the same
    /// lock unsubscription clears.
    pub fn publish(&self, session_id: &str, session: &GameSession) {
        // Clone the slots out so delivery runs without the registry
        // lock held; a callback may itself subscribe or unsubscribe.
        let batch: Vec<(u64, CallbackSlot)> = {
            let subscribers = self.subscribers.lock().expect("subscriber map poisoned");
            match subscribers.get(session_id) {
                Some(list) => list
                    .iter()
                    .map(|s| (s.token, Arc::clone(&s.slot)))
                    .collect(),
                None => return,
            }
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (token, slot) in &batch {
            let mut guard = slot.lock().expect("callback slot poisoned");
            let Some(callback) = guard.as_ref().map(Arc::clone) else {
                // Unsubscribed since the batch was taken.
                continue;
            };
            if callback(session) {
                delivered += 1;
            } else {
                warn!(session_id, token, "Subscriber failed, removing");
                guard.take();
                failed.push(*token);
            }
        }

        for token in failed {
            self.remove(session_id, token);
        }

        debug!(session_id, delivered, "Published snapshot");
    }

    /// Number of active subscribers for a session.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        let subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        subscribers.get(session_id).map_or(0, Vec::len)
    }

    fn remove(&self, session_id: &str, token: u64) {
        let mut subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        if let Some(list) = subscribers.get_mut(session_id) {
            list.retain(|s| s.token != token);
            if list.is_empty() {
                subscribers.remove(session_id);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

/// Handle to an active subscription; unsubscribes on drop.
pub struct Subscription {
    bus: EventBus,
    session_id: SessionId,
    token: u64,
    slot: CallbackSlot,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Removes the registration immediately. No further callback
    /// invocations happen after this returns, including from a publish
    /// already in flight on another thread.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Clearing the slot waits out any in-flight invocation of this
        // callback and prevents every later one; then the registry entry
        // goes away. Poisoning means a callback panicked, in which case
        // the slot contents are unreachable anyway.
        if let Ok(mut guard) = self.slot.lock() {
            guard.take();
        }
        self.bus.remove(&self.session_id, self.token);
        debug!(session_id = %self.session_id, token = self.token, "Subscriber removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameMode;

    fn session() -> GameSession {
        GameSession::new(GameMode::Pvp, None)
    }

    #[test]
    fn test_two_subscribers_both_receive() {
        let bus = EventBus::new();
        let game = session();

        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let first_log = Arc::clone(&first);
        let _a = bus.subscribe(&game.id, move |s| {
            first_log.lock().unwrap().push(s.clone());
            true
        });
        let second_log = Arc::clone(&second);
        let b = bus.subscribe(&game.id, move |s| {
            second_log.lock().unwrap().push(s.clone());
            true
        });

        bus.publish(&game.id, &game);
        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 1);
        assert_eq!(first.lock().unwrap()[0], second.lock().unwrap()[0]);

        b.unsubscribe();
        bus.publish(&game.id, &game);
        assert_eq!(first.lock().unwrap().len(), 2);
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failing_subscriber_removed_without_blocking_others() {
        let bus = EventBus::new();
        let game = session();

        let delivered = Arc::new(AtomicU64::new(0));

        let _broken = bus.subscribe(&game.id, |_| false);
        let count = Arc::clone(&delivered);
        let _healthy = bus.subscribe(&game.id, move |_| {
            count.fetch_add(1, Ordering::Relaxed);
            true
        });

        bus.publish(&game.id, &game);
        assert_eq!(delivered.load(Ordering::Relaxed), 1);
        assert_eq!(bus.subscriber_count(&game.id), 1);

        bus.publish(&game.id, &game);
        assert_eq!(delivered.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_last_unsubscribe_frees_session_set() {
        let bus = EventBus::new();
        let game = session();

        let sub = bus.subscribe(&game.id, |_| true);
        assert_eq!(bus.subscriber_count(&game.id), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(&game.id), 0);
    }

    #[test]
    fn test_unsubscribe_during_publish_blocks_later_delivery() {
        use std::sync::Barrier;

        let bus = EventBus::new();
        let game = session();

        // First subscriber parks inside its callback so the publish is
        // caught mid-delivery, before the second subscriber's turn.
        let barrier = Arc::new(Barrier::new(2));
        let gate = Arc::clone(&barrier);
        let _parked = bus.subscribe(&game.id, move |_| {
            gate.wait();
            gate.wait();
            true
        });

        let fired = Arc::new(AtomicU64::new(0));
        let count = Arc::clone(&fired);
        let second = bus.subscribe(&game.id, move |_| {
            count.fetch_add(1, Ordering::Relaxed);
            true
        });

        let publisher = {
            let bus = bus.clone();
            let game = game.clone();
            std::thread::spawn(move || bus.publish(&game.id, &game))
        };

        barrier.wait();
        // The publish is paused inside the first callback; once this
        // returns the second callback must never run.
        second.unsubscribe();
        barrier.wait();
        publisher.join().unwrap();

        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        let game = session();
        bus.publish(&game.id, &game);
    }
}
