//! # Bot State
//!
//! Owned, in-memory state threaded through the dispatch context. All access
//! happens from the event loop; the `Mutex` in `BotContext` serializes the
//! short critical sections around awaited calls.

use std::collections::HashMap;

use crate::domain::types::MessageRef;

#[derive(Debug, Default)]
pub struct BotState {
    /// In-flight subscribe/unsubscribe requests awaiting provider
    /// acknowledgment, keyed by external user id. At most one entry per id.
    pending: HashMap<String, MessageRef>,
    /// Most recent announcement message per streamer. Process-lifetime;
    /// entries are replaced but never removed.
    pub announcements: HashMap<String, MessageRef>,
}

impl BotState {
    /// Records an in-flight request. A repeated request for the same id
    /// overwrites the earlier entry without completing it; whether that is
    /// intended last-wins behavior is an open question, so the behavior is
    /// kept observable and exercised by tests.
    pub fn record_pending(&mut self, user_id: impl Into<String>, message: MessageRef) {
        self.pending.insert(user_id.into(), message);
    }

    /// Removes and returns the pending entry for an id, if any.
    pub fn take_pending(&mut self, user_id: &str) -> Option<MessageRef> {
        self.pending.remove(user_id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(event_id: &str) -> MessageRef {
        MessageRef {
            room_id: "!ops".into(),
            event_id: event_id.into(),
        }
    }

    #[test]
    fn take_pending_removes_entry() {
        let mut state = BotState::default();
        state.record_pending("7", msg("$a"));
        assert_eq!(state.take_pending("7"), Some(msg("$a")));
        assert_eq!(state.take_pending("7"), None);
    }

    #[test]
    fn repeated_request_overwrites_pending_entry() {
        // Last request wins; the first in-flight confirmation is dropped
        // silently. Kept behavior, see DESIGN.md.
        let mut state = BotState::default();
        state.record_pending("7", msg("$first"));
        state.record_pending("7", msg("$second"));
        assert_eq!(state.pending_len(), 1);
        assert_eq!(state.take_pending("7"), Some(msg("$second")));
    }
}
