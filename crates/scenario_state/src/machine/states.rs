//! Page states - Load phase, turn phase and the state object holding them
//!
//! The load phase tracks fetching the tree; the turn phase tracks whose move
//! it is on the selected path and whether a request is in flight.

use dialogue_core::{Bookmark, DialogueNode, Party, ResponseOption};
use serde::{Deserialize, Serialize};

/// Lifecycle of the tree fetch.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed {
        error_message: String,
        failed_at: String,
    },
}

/// Whose move it is, and what the UI may do about it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No tree to play on.
    #[default]
    Inactive,

    /// Party A may type a statement or pick a suggested one.
    PartyAAwaitingInput { options: Vec<ResponseOption> },

    /// Party B's candidate replies are waiting to be picked.
    PartyBAwaitingSelection { options: Vec<ResponseOption> },

    /// Next statements for `party` are being generated.
    Generating { party: Party },

    /// A typed statement is being stored.
    Submitting,

    /// A picked statement is being marked selected.
    Selecting,
}

/// Payload-free view of a turn phase, for history and errors.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Inactive,
    PartyAAwaitingInput,
    PartyBAwaitingSelection,
    Generating,
    Submitting,
    Selecting,
}

impl TurnPhase {
    /// Turn implied by the selected path of `tree`.
    pub fn derive(tree: &DialogueNode) -> Self {
        let options = tree.selected_leaf().response_options();
        match tree.next_party() {
            Party::A => TurnPhase::PartyAAwaitingInput { options },
            Party::B => TurnPhase::PartyBAwaitingSelection { options },
        }
    }

    pub fn kind(&self) -> TurnKind {
        match self {
            TurnPhase::Inactive => TurnKind::Inactive,
            TurnPhase::PartyAAwaitingInput { .. } => TurnKind::PartyAAwaitingInput,
            TurnPhase::PartyBAwaitingSelection { .. } => TurnKind::PartyBAwaitingSelection,
            TurnPhase::Generating { .. } => TurnKind::Generating,
            TurnPhase::Submitting => TurnKind::Submitting,
            TurnPhase::Selecting => TurnKind::Selecting,
        }
    }

    /// Options currently on offer, if the UI is waiting on a choice.
    pub fn options(&self) -> &[ResponseOption] {
        match self {
            TurnPhase::PartyAAwaitingInput { options }
            | TurnPhase::PartyBAwaitingSelection { options } => options,
            _ => &[],
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            TurnPhase::PartyAAwaitingInput { .. } | TurnPhase::PartyBAwaitingSelection { .. }
        )
    }

    /// True while a request triggered from this page is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TurnPhase::Generating { .. } | TurnPhase::Submitting | TurnPhase::Selecting
        )
    }
}

/// Load and turn phase at one instant.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PhaseSnapshot {
    pub load: LoadPhase,
    pub turn: TurnKind,
}

/// Everything a simulation page holds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ScenarioState {
    pub load: LoadPhase,
    pub turn: TurnPhase,
    pub tree: Option<DialogueNode>,
    pub bookmarks: Vec<Bookmark>,
    /// Last user-facing failure message, cleared by the next success
    pub last_error: Option<String>,
}

impl ScenarioState {
    pub fn snapshot(&self) -> PhaseSnapshot {
        PhaseSnapshot {
            load: self.load.clone(),
            turn: self.turn.kind(),
        }
    }

    /// Nodes root → selected leaf, for the conversation sidebar.
    pub fn conversation(&self) -> Vec<&DialogueNode> {
        self.tree
            .as_ref()
            .map(|tree| tree.selected_path())
            .unwrap_or_default()
    }

    pub fn selected_leaf(&self) -> Option<&DialogueNode> {
        self.tree.as_ref().map(|tree| tree.selected_leaf())
    }
}

#[cfg(test)]
mod tests {
    use dialogue_core::NodeId;

    use super::*;

    fn node(id: i64, statement: &str, party: Party) -> DialogueNode {
        DialogueNode::new(id, statement, party)
    }

    #[test]
    fn derive_offers_party_b_replies_after_party_a() {
        let tree = node(1, "opening", Party::B)
            .with_child(
                node(2, "counter", Party::A)
                    .with_child(node(3, "accept", Party::B))
                    .with_child(node(4, "reject", Party::B)),
            )
            .with_selected_path(&NodeId::Persisted(2));

        let turn = TurnPhase::derive(&tree);
        assert_eq!(turn.kind(), TurnKind::PartyBAwaitingSelection);
        let texts: Vec<&str> = turn.options().iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["accept", "reject"]);
    }

    #[test]
    fn derive_waits_for_party_a_after_party_b() {
        let tree = node(1, "opening", Party::B);
        let turn = TurnPhase::derive(&tree);
        assert_eq!(turn, TurnPhase::PartyAAwaitingInput { options: vec![] });
        assert!(turn.is_awaiting());
        assert!(!turn.is_busy());
    }

    #[test]
    fn empty_state_has_no_conversation() {
        let state = ScenarioState::default();
        assert!(state.conversation().is_empty());
        assert!(state.selected_leaf().is_none());
        assert_eq!(state.snapshot().turn, TurnKind::Inactive);
    }
}
