//! Per-character conversation memory: a concurrent map from character
//! id to a bounded, ordered message history.
//!
//! The store is keyed by character id; same-key read-modify-write runs
//! under the `DashMap` entry guard so concurrent appends never lose
//! updates, while unrelated characters proceed without contention.
//! History lives in process memory only and does not survive a restart.

use crate::message::{ChatMessage, Role};
use dashmap::DashMap;
use std::collections::VecDeque;

/// Maximum retained turns per character (one turn = user + assistant,
/// i.e. two messages).
pub const MAX_TURNS: usize = 10;

/// Hard cap on stored messages: `2 * MAX_TURNS` plus one slot for a
/// system message.
const MAX_MESSAGES: usize = MAX_TURNS * 2 + 1;

/// Concurrent per-character chat history store.
#[derive(Debug, Default)]
pub struct ChatMemory {
    store: DashMap<i64, VecDeque<ChatMessage>>,
}

impl ChatMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the character's history, oldest first. Creates an
    /// empty entry on first access; never fails.
    pub fn history(&self, character_id: i64) -> Vec<ChatMessage> {
        self.store
            .entry(character_id)
            .or_default()
            .iter()
            .cloned()
            .collect()
    }

    /// Appends to the tail, then evicts from the head while over the
    /// cap. Eviction stops early if the head is a system message; the
    /// system slot is never reclaimed.
    pub fn append(&self, character_id: i64, msg: ChatMessage) {
        let mut queue = self.store.entry(character_id).or_default();
        queue.push_back(msg);
        while queue.len() > MAX_MESSAGES {
            let head_is_system = queue.front().is_some_and(|m| m.role == Role::System);
            if head_is_system {
                break;
            }
            queue.pop_front();
        }
    }

    /// Drops the character's history entirely. A later [`history`]
    /// call starts from a fresh empty sequence.
    ///
    /// [`history`]: ChatMemory::history
    pub fn clear(&self, character_id: i64) {
        self.store.remove(&character_id);
    }

    /// Number of stored messages for the character (0 if absent).
    pub fn len(&self, character_id: i64) -> usize {
        self.store.get(&character_id).map_or(0, |q| q.len())
    }

    pub fn is_empty(&self, character_id: i64) -> bool {
        self.len(character_id) == 0
    }
}
