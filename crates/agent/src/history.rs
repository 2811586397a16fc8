//! Per-session conversation history
//!
//! Process-wide and in memory only. Each session holds at most the
//! configured number of turns; older turns are evicted from the front.
//! Updates are last-write-wins: two concurrent requests on the same session
//! both read the same snapshot and the later append wins.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

use pastport_core::Turn;

/// Session id -> bounded turn sequence
#[derive(Debug, Default)]
pub struct HistoryStore {
    sessions: RwLock<HashMap<String, VecDeque<Turn>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's turns, oldest first; empty if unseen
    pub fn get_history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .get(session_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append `new_turns` and keep only the last `max_len`
    pub fn append_and_trim(&self, session_id: &str, new_turns: Vec<Turn>, max_len: usize) {
        let mut sessions = self.sessions.write();
        let turns = sessions.entry(session_id.to_string()).or_default();
        turns.extend(new_turns);
        while turns.len() > max_len {
            turns.pop_front();
        }
    }

    /// Number of turns stored for a session
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .get(session_id)
            .map_or(0, VecDeque::len)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Keep the last `max_len` turns of a caller-supplied history
pub fn truncate_to_last(mut turns: Vec<Turn>, max_len: usize) -> Vec<Turn> {
    if turns.len() > max_len {
        turns.drain(..turns.len() - max_len);
    }
    turns
}
