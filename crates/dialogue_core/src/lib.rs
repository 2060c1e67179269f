//! dialogue_core - Core types for LegalEase negotiation simulations
//!
//! This crate provides the foundational types used across the scenario crates:
//! - `dialogue` - DialogueNode tree model, Party, NodeId
//! - `message` - backend message and branch payloads
//! - `case` - cases, backgrounds and simulations
//! - `bookmark` - named references into a dialogue tree
//! - `audio` - captured audio and WAV encoding

pub mod audio;
pub mod bookmark;
pub mod case;
pub mod config;
pub mod dialogue;
pub mod message;
pub mod paths;

// Re-export commonly used types
pub use audio::{encode_wav, CapturedAudio};
pub use bookmark::{bookmarked_path_ids, Bookmark, NewBookmark};
pub use case::{
    CaseBackground, CaseDetail, CaseSummary, CaseUpdated, NewCase, NewSimulation, Simulation,
    SimulationSummary,
};
pub use config::{Config, ConfigError, ProxyAuth};
pub use dialogue::{DialogueNode, NodeId, Party, ResponseOption, TreeUpdate};
pub use message::{
    BranchNode, CreatedMessage, GenerationError, PathMessage, TreeMessage, TreeResponse,
};
