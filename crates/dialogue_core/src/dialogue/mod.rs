//! Dialogue module - The branching conversation tree of a simulation
//!
//! A simulation is a rooted tree of alternating turns between Party A and
//! Party B. The selected path is the single chain of decided play.

mod node;
mod party;
mod tree;

pub use node::{DialogueNode, NodeId, ResponseOption};
pub use party::Party;
pub use tree::TreeUpdate;
