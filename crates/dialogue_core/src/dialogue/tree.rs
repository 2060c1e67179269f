//! Tree operations - Lookup, path and copy-on-write updates
//!
//! Every traversal is a depth-first walk visiting children in order. Updates
//! never mutate the receiver: ancestors on the way to the edited node are
//! copied, untouched subtrees are shared through their `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use super::node::{DialogueNode, NodeId};
use super::party::Party;
use crate::message::{BranchNode, TreeMessage};

/// Outcome of an update addressed to a node id.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum TreeUpdate {
    /// The tree with the edit applied.
    Updated(DialogueNode),
    /// The addressed node does not exist; nothing changed.
    NotFound,
}

impl TreeUpdate {
    pub fn is_updated(&self) -> bool {
        matches!(self, TreeUpdate::Updated(_))
    }

    pub fn into_tree(self) -> Option<DialogueNode> {
        match self {
            TreeUpdate::Updated(tree) => Some(tree),
            TreeUpdate::NotFound => None,
        }
    }

    /// The updated tree, or `original` when the target was missing.
    pub fn unwrap_or(self, original: DialogueNode) -> DialogueNode {
        self.into_tree().unwrap_or(original)
    }
}

impl From<Option<DialogueNode>> for TreeUpdate {
    fn from(tree: Option<DialogueNode>) -> Self {
        tree.map_or(TreeUpdate::NotFound, TreeUpdate::Updated)
    }
}

impl DialogueNode {
    /// First node (pre-order) with the given id.
    pub fn find(&self, id: &NodeId) -> Option<&DialogueNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Nodes from the root down to `target`, both included.
    pub fn path_to(&self, target: &NodeId) -> Option<Vec<&DialogueNode>> {
        let mut path = Vec::new();
        self.collect_path(target, &mut path).then_some(path)
    }

    fn collect_path<'a>(&'a self, target: &NodeId, path: &mut Vec<&'a DialogueNode>) -> bool {
        path.push(self);
        if &self.id == target {
            return true;
        }
        for child in &self.children {
            if child.collect_path(target, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Root followed by the selected child at each level, up to the first
    /// node without one.
    pub fn selected_path(&self) -> Vec<&DialogueNode> {
        let mut path = vec![self];
        let mut current = self;
        while let Some(next) = current.children.iter().find(|child| child.selected) {
            current = next.as_ref();
            path.push(current);
        }
        path
    }

    /// Frontier of decided play.
    pub fn selected_leaf(&self) -> &DialogueNode {
        self.selected_path().last().copied().unwrap_or(self)
    }

    /// Party expected to speak after the selected leaf.
    pub fn next_party(&self) -> Party {
        self.selected_leaf().party.opposite()
    }

    /// Append freshly generated branches under `parent_id`.
    pub fn merge_branches(&self, parent_id: &NodeId, branches: &BranchNode) -> TreeUpdate {
        self.update_at(parent_id, &mut |parent| {
            let mut parent = parent.clone();
            let offset = parent.children.len();
            let generated = branches
                .responses
                .iter()
                .enumerate()
                .map(|(idx, response)| {
                    Arc::new(DialogueNode::from_branch(response, &parent.id, offset + idx))
                })
                .collect::<Vec<_>>();
            parent.children.extend(generated);
            parent
        })
        .into()
    }

    /// Mark exactly the nodes on the path to `target` as selected.
    ///
    /// An absent target leaves no node selected.
    pub fn with_selected_path(&self, target: &NodeId) -> DialogueNode {
        let on_path: HashSet<&NodeId> = self
            .path_to(target)
            .unwrap_or_default()
            .into_iter()
            .map(|node| &node.id)
            .collect();
        self.mark_selected(&on_path)
    }

    fn mark_selected(&self, on_path: &HashSet<&NodeId>) -> DialogueNode {
        DialogueNode {
            id: self.id.clone(),
            statement: self.statement.clone(),
            party: self.party,
            role: self.role.clone(),
            selected: on_path.contains(&self.id),
            children: self
                .children
                .iter()
                .map(|child| Arc::new(child.mark_selected(on_path)))
                .collect(),
        }
    }

    /// Append a stored message as the new selected leaf under `parent_id`.
    pub fn add_custom_message(
        &self,
        parent_id: &NodeId,
        message_id: i64,
        content: &str,
        role: &str,
    ) -> TreeUpdate {
        let leaf = Arc::new(DialogueNode::with_role(message_id, content, role).selected(true));
        self.update_at(parent_id, &mut |parent| {
            let mut parent = parent.clone();
            for sibling in parent.children.iter_mut().filter(|child| child.selected) {
                Arc::make_mut(sibling).selected = false;
            }
            parent.children.push(Arc::clone(&leaf));
            parent
        })
        .into()
    }

    /// Give the pending children of `parent_id` the ids the backend stored
    /// them under.
    ///
    /// A pending child adopts the first unclaimed persisted message with the
    /// same content. Persisted messages without a local counterpart are
    /// appended, pending children without a persisted counterpart are kept.
    pub fn reconcile_children(&self, parent_id: &NodeId, persisted: &[TreeMessage]) -> TreeUpdate {
        self.update_at(parent_id, &mut |parent| {
            let mut parent = parent.clone();
            let mut claimed: Vec<bool> = persisted
                .iter()
                .map(|message| {
                    let id = NodeId::Persisted(message.id);
                    parent.children.iter().any(|child| child.id == id)
                })
                .collect();

            for child in parent.children.iter_mut().filter(|child| child.id.is_pending()) {
                let matched = (0..persisted.len())
                    .find(|&idx| !claimed[idx] && persisted[idx].content == child.statement);
                let Some(idx) = matched else {
                    continue;
                };
                claimed[idx] = true;
                let message = &persisted[idx];
                let node = Arc::make_mut(child);
                node.id = NodeId::Persisted(message.id);
                node.selected = message.selected;
                if !message.children.is_empty() {
                    node.children = message
                        .children
                        .iter()
                        .map(|grandchild| Arc::new(DialogueNode::from_message(grandchild)))
                        .collect();
                }
            }

            for (message, _) in persisted.iter().zip(&claimed).filter(|(_, claimed)| !**claimed) {
                parent
                    .children
                    .push(Arc::new(DialogueNode::from_message(message)));
            }
            parent
        })
        .into()
    }

    /// Rebuild the ancestors of `target` around the result of `edit`.
    fn update_at(
        &self,
        target: &NodeId,
        edit: &mut dyn FnMut(&DialogueNode) -> DialogueNode,
    ) -> Option<DialogueNode> {
        if &self.id == target {
            return Some(edit(self));
        }
        for (idx, child) in self.children.iter().enumerate() {
            if let Some(updated) = child.update_at(target, edit) {
                let mut copy = self.clone();
                copy.children[idx] = Arc::new(updated);
                return Some(copy);
            }
        }
        None
    }
}
