use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::party::Party;
use crate::message::{BranchNode, TreeMessage};

/// Identity of a dialogue node.
///
/// Nodes the backend has stored carry its numeric id; nodes generated on the
/// client and not yet reconciled carry a local placeholder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum NodeId {
    Persisted(i64),
    Pending(String),
}

impl NodeId {
    /// Backend id, if the node has been stored.
    pub fn persisted(&self) -> Option<i64> {
        match self {
            NodeId::Persisted(id) => Some(*id),
            NodeId::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, NodeId::Pending(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Persisted(id) => write!(f, "{id}"),
            NodeId::Pending(local) => f.write_str(local),
        }
    }
}

impl FromStr for NodeId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only canonical digit strings are stored ids; "+7" or "007" stay local.
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'));
        Ok(match s.parse::<i64>() {
            Ok(id) if canonical => NodeId::Persisted(id),
            _ => NodeId::Pending(s.to_string()),
        })
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId::Persisted(id)
    }
}

/// One turn in a simulated negotiation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DialogueNode {
    pub id: NodeId,
    pub statement: String,
    pub party: Party,
    /// Raw backend role the party was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// True if this node lies on the active path
    #[serde(default)]
    pub selected: bool,
    /// Alternative next turns, in generation order
    #[serde(default)]
    pub children: Vec<Arc<DialogueNode>>,
}

impl DialogueNode {
    /// Create a childless node.
    pub fn new(id: impl Into<NodeId>, statement: impl Into<String>, party: Party) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            party,
            role: None,
            selected: false,
            children: Vec::new(),
        }
    }

    /// Create a node from a backend role string.
    pub fn with_role(
        id: impl Into<NodeId>,
        statement: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        let role = role.into();
        Self {
            id: id.into(),
            statement: statement.into(),
            party: Party::from_role(&role),
            role: Some(role),
            selected: false,
            children: Vec::new(),
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_child(mut self, child: DialogueNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Convert a stored backend message and its descendants.
    pub fn from_message(message: &TreeMessage) -> Self {
        Self {
            id: NodeId::Persisted(message.id),
            statement: message.content.clone(),
            party: Party::from_role(&message.role),
            role: Some(message.role.clone()),
            selected: message.selected,
            children: message
                .children
                .iter()
                .map(|child| Arc::new(Self::from_message(child)))
                .collect(),
        }
    }

    /// Build the tree from the roots returned by the backend.
    ///
    /// A simulation has a single root; extra roots are ignored.
    pub fn from_messages(messages: &[TreeMessage]) -> Option<Self> {
        if messages.len() > 1 {
            log::warn!(
                "Tree response has {} roots, using the first one",
                messages.len()
            );
        }
        messages.first().map(Self::from_message)
    }

    /// Convert a freshly generated branch. Ids are placeholders derived from
    /// the parent id until the backend's ids are reconciled.
    pub(crate) fn from_branch(branch: &BranchNode, parent_id: &NodeId, index: usize) -> Self {
        let id = NodeId::Pending(format!("{parent_id}-child-{index}"));
        let children = branch
            .responses
            .iter()
            .enumerate()
            .map(|(idx, response)| Arc::new(Self::from_branch(response, &id, idx)))
            .collect();
        Self {
            party: Party::from_role(&branch.speaker),
            role: Some(branch.speaker.clone()),
            statement: branch.line.clone(),
            selected: false,
            children,
            id,
        }
    }

    /// True iff the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|child| child.node_count()).sum::<usize>()
    }

    /// Children of this node offered as next statements.
    pub fn response_options(&self) -> Vec<ResponseOption> {
        self.children
            .iter()
            .map(|child| ResponseOption {
                id: child.id.clone(),
                text: child.statement.clone(),
            })
            .collect()
    }
}

/// A suggested next statement, offered before the user commits to it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResponseOption {
    pub id: NodeId,
    pub text: String,
}
