use serde::{Deserialize, Serialize};

/// Body of `POST /continue-conversation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContinueConversationRequest {
    pub case_id: i64,
    pub tree_id: i64,
    /// Selected leaf to generate under; absent for a fresh simulation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    /// Regenerate the existing children instead of adding more.
    #[serde(default)]
    pub refresh: bool,
}

/// Body of `POST /messages/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateMessageRequest {
    pub tree_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub role: String,
}

/// Body of `POST /messages/create-summarized`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizedMessageRequest {
    pub simulation_id: i64,
    pub parent_id: Option<i64>,
    pub user_input: String,
    pub role: String,
    /// Target word count of the stored statement
    pub desired_length: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionResponse {
    pub message: String,
}
