//! Message module - Payloads exchanged with the scenario backend
//!
//! `TreeMessage` is a stored turn, `BranchNode` is a generated turn that
//! the backend has not yet reported ids for.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored message and its descendants, as returned by the tree endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TreeMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub children: Vec<TreeMessage>,
}

/// A flat stored message, as returned by the selected-path endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PathMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub selected: bool,
    pub parent_id: Option<i64>,
    pub tree_id: i64,
}

/// A generated turn with its candidate follow-ups.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BranchNode {
    pub speaker: String,
    pub line: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub reflects_personality: String,
    #[serde(default)]
    pub responses: Vec<BranchNode>,
}

/// Result of a continue-conversation call.
///
/// Generation can fail without a non-2xx status; the failure is then
/// reported in `error`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TreeResponse {
    pub tree_id: Option<i64>,
    pub case_id: i64,
    #[serde(default)]
    pub simulation_goal: String,
    #[serde(default)]
    pub scenarios_tree: Option<BranchNode>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub raw_response: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Generation failed: {0}")]
pub struct GenerationError(pub String);

impl TreeResponse {
    /// The generated branches, or the failure the backend reported.
    pub fn into_branches(self) -> Result<BranchNode, GenerationError> {
        if let Some(error) = self.error.filter(|error| !error.is_empty()) {
            return Err(GenerationError(error));
        }
        self.scenarios_tree
            .ok_or_else(|| GenerationError("response contained no scenarios tree".to_string()))
    }
}

/// A message the backend has just stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreatedMessage {
    pub id: i64,
    pub content: String,
    pub role: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, alias = "tree_id")]
    pub simulation_id: Option<i64>,
    pub parent_id: Option<i64>,
}
