//! Per-session rolling conversation history.
//!
//! Each session holds at most `max_turns` [`ConversationTurn`]s; appending
//! beyond that evicts the oldest turns first. Sessions are keyed by a
//! caller-supplied identifier and live for the process lifetime, bounded
//! by `max_sessions` with least-recently-used eviction.
//!
//! All state sits behind one `std::sync::Mutex`. The lock is only taken
//! for a snapshot or for a whole append-and-truncate, and never across an
//! `.await`, so concurrent turns on the same session cannot lose or
//! duplicate each other's entries.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::config::HistoryConfig;
use crate::models::ConversationTurn;

struct Session {
    turns: VecDeque<ConversationTurn>,
    last_used: u64,
}

struct Inner {
    sessions: HashMap<String, Session>,
    /// Monotonic use counter for LRU ordering.
    clock: u64,
}

/// In-memory store of rolling histories, one per session.
pub struct SessionStore {
    inner: Mutex<Inner>,
    max_turns: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                clock: 0,
            }),
            max_turns,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_turns, config.max_sessions)
    }

    // A panic while holding the lock leaves the maps structurally valid,
    // so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current turns of `session`, oldest first. Unknown sessions are empty.
    pub fn snapshot(&self, session: &str) -> Vec<ConversationTurn> {
        let mut inner = self.lock();
        inner.clock += 1;
        let now = inner.clock;
        match inner.sessions.get_mut(session) {
            Some(s) => {
                s.last_used = now;
                s.turns.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Append a user turn and a model turn, then truncate to `max_turns`.
    pub fn record_exchange(&self, session: &str, user_text: &str, model_text: &str) {
        let mut inner = self.lock();
        inner.clock += 1;
        let now = inner.clock;

        if !inner.sessions.contains_key(session) && inner.sessions.len() >= self.max_sessions {
            evict_least_recent(&mut inner.sessions);
        }

        let entry = inner
            .sessions
            .entry(session.to_string())
            .or_insert_with(|| Session {
                turns: VecDeque::with_capacity(self.max_turns + 2),
                last_used: now,
            });

        entry.last_used = now;
        entry.turns.push_back(ConversationTurn::user(user_text));
        entry.turns.push_back(ConversationTurn::model(model_text));
        while entry.turns.len() > self.max_turns {
            entry.turns.pop_front();
        }
    }

    /// Number of turns currently held for `session`.
    pub fn len(&self, session: &str) -> usize {
        self.lock()
            .sessions
            .get(session)
            .map_or(0, |s| s.turns.len())
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

fn evict_least_recent(sessions: &mut HashMap<String, Session>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, s)| s.last_used)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        sessions.remove(&id);
    }
}
