//! Scenario events - Completions of requests issued by a simulation page
//!
//! Events answering a request carry the ticket it was issued with so that
//! stale completions can be told apart from current ones.

use dialogue_core::{Bookmark, BranchNode, CreatedMessage, DialogueNode, NodeId, TreeMessage};
use serde::{Deserialize, Serialize};

use crate::sequencer::RequestTicket;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioEvent {
    // ========== Tree Loading ==========
    /// The backend returned the simulation tree.
    TreeLoaded {
        ticket: RequestTicket,
        tree: DialogueNode,
    },

    /// The tree could not be fetched.
    LoadFailed { ticket: RequestTicket, error: String },

    // ========== Generation ==========
    /// New candidate turns were generated under `parent_id`.
    BranchesGenerated {
        ticket: RequestTicket,
        parent_id: NodeId,
        branches: BranchNode,
    },

    /// The backend reported the stored children of `parent_id`.
    BranchesReconciled {
        ticket: RequestTicket,
        parent_id: NodeId,
        children: Vec<TreeMessage>,
    },

    GenerationFailed { ticket: RequestTicket, error: String },

    // ========== Typed Statements ==========
    /// A typed statement was stored under `parent_id`.
    MessageCreated {
        ticket: RequestTicket,
        parent_id: NodeId,
        message: CreatedMessage,
    },

    SubmissionFailed { ticket: RequestTicket, error: String },

    // ========== Selection ==========
    /// `node_id` is now the end of the active path on the backend.
    NodeSelected {
        ticket: RequestTicket,
        node_id: NodeId,
    },

    SelectionFailed { ticket: RequestTicket, error: String },

    // ========== Bookmarks ==========
    BookmarksLoaded {
        ticket: RequestTicket,
        bookmarks: Vec<Bookmark>,
    },

    BookmarkAdded { bookmark: Bookmark },

    BookmarkRemoved { bookmark_id: i64 },
}

impl ScenarioEvent {
    /// Ticket of the request this event completes, if any.
    pub fn ticket(&self) -> Option<&RequestTicket> {
        match self {
            ScenarioEvent::TreeLoaded { ticket, .. }
            | ScenarioEvent::LoadFailed { ticket, .. }
            | ScenarioEvent::BranchesGenerated { ticket, .. }
            | ScenarioEvent::BranchesReconciled { ticket, .. }
            | ScenarioEvent::GenerationFailed { ticket, .. }
            | ScenarioEvent::MessageCreated { ticket, .. }
            | ScenarioEvent::SubmissionFailed { ticket, .. }
            | ScenarioEvent::NodeSelected { ticket, .. }
            | ScenarioEvent::SelectionFailed { ticket, .. }
            | ScenarioEvent::BookmarksLoaded { ticket, .. } => Some(ticket),
            ScenarioEvent::BookmarkAdded { .. } | ScenarioEvent::BookmarkRemoved { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioEvent::TreeLoaded { .. } => "tree_loaded",
            ScenarioEvent::LoadFailed { .. } => "load_failed",
            ScenarioEvent::BranchesGenerated { .. } => "branches_generated",
            ScenarioEvent::BranchesReconciled { .. } => "branches_reconciled",
            ScenarioEvent::GenerationFailed { .. } => "generation_failed",
            ScenarioEvent::MessageCreated { .. } => "message_created",
            ScenarioEvent::SubmissionFailed { .. } => "submission_failed",
            ScenarioEvent::NodeSelected { .. } => "node_selected",
            ScenarioEvent::SelectionFailed { .. } => "selection_failed",
            ScenarioEvent::BookmarksLoaded { .. } => "bookmarks_loaded",
            ScenarioEvent::BookmarkAdded { .. } => "bookmark_added",
            ScenarioEvent::BookmarkRemoved { .. } => "bookmark_removed",
        }
    }
}
