//! Bookmarks - Named references to a node of a simulation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dialogue::{DialogueNode, NodeId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bookmark {
    pub id: i64,
    pub simulation_id: i64,
    pub message_id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewBookmark {
    pub simulation_id: i64,
    pub message_id: i64,
    pub name: String,
}

/// Every node lying on the path from the root to a bookmarked node.
///
/// Bookmarks pointing outside the tree contribute nothing.
pub fn bookmarked_path_ids(tree: &DialogueNode, bookmarks: &[Bookmark]) -> HashSet<NodeId> {
    bookmarks
        .iter()
        .filter_map(|bookmark| tree.path_to(&NodeId::Persisted(bookmark.message_id)))
        .flatten()
        .map(|node| node.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Party;

    fn bookmark(id: i64, message_id: i64) -> Bookmark {
        Bookmark {
            id,
            simulation_id: 1,
            message_id,
            name: format!("mark {id}"),
        }
    }

    #[test]
    fn collects_union_of_bookmarked_paths() {
        let tree = DialogueNode::new(1_i64, "root", Party::B)
            .with_child(DialogueNode::new(2_i64, "a", Party::A))
            .with_child(
                DialogueNode::new(3_i64, "b", Party::A)
                    .with_child(DialogueNode::new(4_i64, "c", Party::B)),
            );

        let ids = bookmarked_path_ids(&tree, &[bookmark(1, 4), bookmark(2, 2), bookmark(3, 99)]);
        let expected: HashSet<NodeId> = [1, 2, 3, 4].into_iter().map(NodeId::Persisted).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn no_bookmarks_no_ids() {
        let tree = DialogueNode::new(1_i64, "root", Party::B);
        assert!(bookmarked_path_ids(&tree, &[]).is_empty());
    }
}
