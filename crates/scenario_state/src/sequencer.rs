//! Request sequencing - Drop responses that arrive after a newer request
//!
//! Every request is issued a ticket carrying a sequence number that grows
//! across all kinds. A response is applied only if its ticket is still the
//! latest one issued for its kind; a ticket stays current until a newer one
//! of its kind is issued or the page is left.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Logical operation a request belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    LoadTree,
    Generate,
    Submit,
    Select,
    Bookmarks,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    last_seq: u64,
    latest: HashMap<RequestKind, u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket superseding every earlier ticket of the same kind.
    pub fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        self.last_seq += 1;
        self.latest.insert(kind, self.last_seq);
        RequestTicket {
            kind,
            seq: self.last_seq,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate_all(&mut self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older_of_same_kind() {
        let mut sequencer = RequestSequencer::new();
        let first = sequencer.issue(RequestKind::LoadTree);
        let second = sequencer.issue(RequestKind::LoadTree);
        assert!(!sequencer.is_current(&first));
        assert!(sequencer.is_current(&second));
        assert!(second.seq > first.seq);
    }

    #[test]
    fn kinds_are_tracked_independently() {
        let mut sequencer = RequestSequencer::new();
        let load = sequencer.issue(RequestKind::LoadTree);
        let select = sequencer.issue(RequestKind::Select);
        assert!(sequencer.is_current(&load));
        assert!(sequencer.is_current(&select));
    }

    #[test]
    fn invalidated_tickets_stay_stale() {
        let mut sequencer = RequestSequencer::new();
        let generate = sequencer.issue(RequestKind::Generate);
        sequencer.invalidate_all();
        assert!(!sequencer.is_current(&generate));

        let again = sequencer.issue(RequestKind::Generate);
        assert!(sequencer.is_current(&again));
        assert!(!sequencer.is_current(&generate));
    }
}
