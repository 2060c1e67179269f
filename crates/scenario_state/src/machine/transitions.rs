//! State transitions - Reducer for a simulation page
//!
//! Requests are begun through `begin_*`, which checks the page may issue
//! them and hands out a ticket. Their completions come back through
//! `handle_event`.

use std::collections::HashSet;

use dialogue_core::{bookmarked_path_ids, DialogueNode, NodeId, TreeUpdate};
use thiserror::Error;

use super::events::ScenarioEvent;
use super::states::{LoadPhase, PhaseSnapshot, ScenarioState, TurnKind, TurnPhase};
use crate::sequencer::{RequestKind, RequestSequencer, RequestTicket};

/// Error type for requests and events the current state cannot accept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Simulation is not loaded: {0:?}")]
    NotReady(LoadPhase),

    #[error("A request is already in flight: {0:?}")]
    Busy(TurnKind),

    #[error("Cannot {action} while {turn:?}")]
    InvalidTransition { turn: TurnKind, action: &'static str },

    #[error("Node {0} is not in the tree")]
    UnknownNode(NodeId),
}

/// Record of one handled event.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: PhaseSnapshot,
    pub to: PhaseSnapshot,
    pub event: &'static str,
    /// False when the event answered a superseded request and was dropped.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct ScenarioMachine {
    state: ScenarioState,
    sequencer: RequestSequencer,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    max_history: usize,
}

impl Default for ScenarioMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioMachine {
    pub fn new() -> Self {
        Self {
            state: ScenarioState::default(),
            sequencer: RequestSequencer::new(),
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    pub fn tree(&self) -> Option<&DialogueNode> {
        self.state.tree.as_ref()
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Ids of every node on a bookmarked path.
    pub fn bookmarked_ids(&self) -> HashSet<NodeId> {
        self.state
            .tree
            .as_ref()
            .map(|tree| bookmarked_path_ids(tree, &self.state.bookmarks))
            .unwrap_or_default()
    }

    // ========== Request Starts ==========

    /// Start (re)fetching the tree. Always allowed; supersedes any earlier load.
    pub fn begin_load(&mut self) -> RequestTicket {
        let from = self.state.snapshot();
        self.state.load = LoadPhase::Loading;
        let ticket = self.sequencer.issue(RequestKind::LoadTree);
        self.record(from, "load_started", true);
        ticket
    }

    /// Start generating the next statements under the selected leaf.
    pub fn begin_generation(&mut self) -> Result<RequestTicket, TransitionError> {
        let tree = self.ready_tree()?;
        let party = tree.next_party();
        self.ensure_idle_turn("generate")?;

        let from = self.state.snapshot();
        self.state.turn = TurnPhase::Generating { party };
        let ticket = self.sequencer.issue(RequestKind::Generate);
        self.record(from, "generation_started", true);
        Ok(ticket)
    }

    /// Start storing a typed Party A statement.
    pub fn begin_submission(&mut self) -> Result<RequestTicket, TransitionError> {
        self.ready_tree()?;
        match &self.state.turn {
            TurnPhase::PartyAAwaitingInput { .. } => {}
            turn if turn.is_busy() => return Err(TransitionError::Busy(turn.kind())),
            turn => {
                return Err(TransitionError::InvalidTransition {
                    turn: turn.kind(),
                    action: "submit a statement",
                })
            }
        }

        let from = self.state.snapshot();
        self.state.turn = TurnPhase::Submitting;
        let ticket = self.sequencer.issue(RequestKind::Submit);
        self.record(from, "submission_started", true);
        Ok(ticket)
    }

    /// Start moving the active path to `node_id`.
    pub fn begin_selection(&mut self, node_id: &NodeId) -> Result<RequestTicket, TransitionError> {
        let tree = self.ready_tree()?;
        if tree.find(node_id).is_none() {
            return Err(TransitionError::UnknownNode(node_id.clone()));
        }
        self.ensure_idle_turn("select a statement")?;

        let from = self.state.snapshot();
        self.state.turn = TurnPhase::Selecting;
        let ticket = self.sequencer.issue(RequestKind::Select);
        self.record(from, "selection_started", true);
        Ok(ticket)
    }

    /// Start fetching bookmarks. Does not block the turn.
    pub fn begin_bookmarks(&mut self) -> RequestTicket {
        self.sequencer.issue(RequestKind::Bookmarks)
    }

    /// Leave the page: outstanding responses become stale and the state is
    /// discarded.
    pub fn navigate_away(&mut self) {
        let from = self.state.snapshot();
        self.sequencer.invalidate_all();
        self.state = ScenarioState::default();
        self.record(from, "navigated_away", true);
    }

    // ========== Completions ==========

    /// Apply a completion. Completions of superseded requests are recorded
    /// as not applied and leave the state untouched.
    pub fn handle_event(
        &mut self,
        event: ScenarioEvent,
    ) -> Result<StateTransition, TransitionError> {
        let from = self.state.snapshot();
        let name = event.name();

        if let Some(ticket) = event.ticket() {
            if !self.sequencer.is_current(ticket) {
                tracing::warn!(event = name, seq = ticket.seq, "dropping stale response");
                return Ok(self.record(from, name, false));
            }
        }

        let outcome = self.apply(event);
        let transition = self.record(from, name, true);
        outcome.map(|()| transition)
    }

    fn apply(&mut self, event: ScenarioEvent) -> Result<(), TransitionError> {
        match event {
            ScenarioEvent::TreeLoaded { tree, .. } => {
                self.state.turn = TurnPhase::derive(&tree);
                self.state.tree = Some(tree);
                self.state.load = LoadPhase::Ready;
                self.state.last_error = None;
            }
            ScenarioEvent::LoadFailed { error, .. } => {
                self.state.load = LoadPhase::Failed {
                    error_message: error.clone(),
                    failed_at: chrono::Utc::now().to_rfc3339(),
                };
                // A reload can fail while a turn request still owns the phase.
                self.restore_turn();
                self.state.last_error = Some(error);
            }
            ScenarioEvent::BranchesGenerated {
                parent_id,
                branches,
                ..
            } => {
                let update = self.require_tree()?.merge_branches(&parent_id, &branches);
                self.replace_tree(update, parent_id, true)?;
            }
            ScenarioEvent::BranchesReconciled {
                parent_id,
                children,
                ..
            } => {
                let update = self.require_tree()?.reconcile_children(&parent_id, &children);
                self.replace_tree(update, parent_id, false)?;
            }
            ScenarioEvent::MessageCreated {
                parent_id, message, ..
            } => {
                let update = self.require_tree()?.add_custom_message(
                    &parent_id,
                    message.id,
                    &message.content,
                    &message.role,
                );
                self.replace_tree(update, parent_id, true)?;
            }
            ScenarioEvent::NodeSelected { node_id, .. } => {
                let tree = self.require_tree()?;
                if tree.find(&node_id).is_none() {
                    self.restore_turn();
                    return Err(TransitionError::UnknownNode(node_id));
                }
                let updated = tree.with_selected_path(&node_id);
                self.state.tree = Some(updated);
                self.restore_turn();
                self.state.last_error = None;
            }
            ScenarioEvent::GenerationFailed { error, .. }
            | ScenarioEvent::SubmissionFailed { error, .. }
            | ScenarioEvent::SelectionFailed { error, .. } => {
                self.restore_turn();
                self.state.last_error = Some(error);
            }
            ScenarioEvent::BookmarksLoaded { bookmarks, .. } => {
                self.state.bookmarks = bookmarks;
            }
            ScenarioEvent::BookmarkAdded { bookmark } => {
                self.state.bookmarks.retain(|existing| existing.id != bookmark.id);
                self.state.bookmarks.push(bookmark);
            }
            ScenarioEvent::BookmarkRemoved { bookmark_id } => {
                self.state.bookmarks.retain(|existing| existing.id != bookmark_id);
            }
        }
        Ok(())
    }

    // ========== Helpers ==========

    fn ready_tree(&self) -> Result<&DialogueNode, TransitionError> {
        match (&self.state.load, &self.state.tree) {
            (LoadPhase::Ready, Some(tree)) => Ok(tree),
            (load, _) => Err(TransitionError::NotReady(load.clone())),
        }
    }

    fn require_tree(&self) -> Result<&DialogueNode, TransitionError> {
        self.state
            .tree
            .as_ref()
            .ok_or_else(|| TransitionError::NotReady(self.state.load.clone()))
    }

    fn ensure_idle_turn(&self, action: &'static str) -> Result<(), TransitionError> {
        let turn = &self.state.turn;
        if turn.is_busy() {
            return Err(TransitionError::Busy(turn.kind()));
        }
        if !turn.is_awaiting() {
            return Err(TransitionError::InvalidTransition {
                turn: turn.kind(),
                action,
            });
        }
        Ok(())
    }

    /// Install an updated tree, or report the missing node and leave the
    /// tree as it was. `completes_turn` is set when the event answers the
    /// request the turn phase is waiting on.
    fn replace_tree(
        &mut self,
        update: TreeUpdate,
        target: NodeId,
        completes_turn: bool,
    ) -> Result<(), TransitionError> {
        let refresh_turn = completes_turn || self.state.turn.is_awaiting();
        match update {
            TreeUpdate::Updated(tree) => {
                self.state.tree = Some(tree);
                if refresh_turn {
                    self.restore_turn();
                }
                self.state.last_error = None;
                Ok(())
            }
            TreeUpdate::NotFound => {
                if refresh_turn {
                    self.restore_turn();
                }
                let error = TransitionError::UnknownNode(target);
                self.state.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Recompute the turn from the selected path.
    fn restore_turn(&mut self) {
        self.state.turn = self
            .state
            .tree
            .as_ref()
            .map(TurnPhase::derive)
            .unwrap_or_default();
    }

    fn record(&mut self, from: PhaseSnapshot, event: &'static str, applied: bool) -> StateTransition {
        let transition = StateTransition {
            from,
            to: self.state.snapshot(),
            event,
            applied,
        };
        tracing::debug!(
            event,
            applied,
            from = ?transition.from.turn,
            to = ?transition.to.turn,
            "scenario transition"
        );

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }
        transition
    }
}
