use async_trait::async_trait;
use bytes::Bytes;
use dialogue_core::{
    Bookmark, CaseBackground, CaseDetail, CaseSummary, CaseUpdated, CreatedMessage, NewBookmark,
    NewCase, NewSimulation, PathMessage, Simulation, TreeMessage, TreeResponse,
};

use crate::api::models::{
    ContinueConversationRequest, CreateMessageRequest, SummarizedMessageRequest,
};
use crate::error::ApiError;

/// Every backend operation a LegalEase page uses.
#[async_trait]
pub trait ScenarioApi: Send + Sync {
    // ========== Cases ==========
    async fn list_cases(&self) -> Result<Vec<CaseSummary>, ApiError>;

    async fn get_case(&self, case_id: i64) -> Result<CaseDetail, ApiError>;

    async fn create_case(&self, case: &NewCase) -> Result<CaseSummary, ApiError>;

    /// Save the background; the backend answers with a regenerated summary.
    async fn update_case(
        &self,
        case_id: i64,
        background: &CaseBackground,
    ) -> Result<CaseUpdated, ApiError>;

    async fn delete_case(&self, case_id: i64) -> Result<(), ApiError>;

    // ========== Simulations ==========
    async fn create_simulation(&self, simulation: &NewSimulation)
        -> Result<Simulation, ApiError>;

    async fn get_simulation(&self, simulation_id: i64) -> Result<Simulation, ApiError>;

    /// Stored messages of a simulation, roots first.
    async fn load_simulation_tree(&self, simulation_id: i64)
        -> Result<Vec<TreeMessage>, ApiError>;

    // ========== Messages ==========
    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<TreeResponse, ApiError>;

    async fn create_message(&self, request: &CreateMessageRequest)
        -> Result<CreatedMessage, ApiError>;

    /// Store free text after the backend has shortened it.
    async fn create_summarized_message(
        &self,
        request: &SummarizedMessageRequest,
    ) -> Result<CreatedMessage, ApiError>;

    async fn select_message(&self, message_id: i64) -> Result<(), ApiError>;

    /// Delete the descendants of `message_id` server-side.
    async fn trim_messages_after(&self, message_id: i64) -> Result<(), ApiError>;

    async fn message_children(&self, message_id: i64) -> Result<Vec<TreeMessage>, ApiError>;

    async fn selected_messages_path(
        &self,
        start_id: i64,
        end_id: i64,
    ) -> Result<Vec<PathMessage>, ApiError>;

    // ========== Bookmarks ==========
    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, ApiError>;

    async fn list_bookmarks(&self, simulation_id: i64) -> Result<Vec<Bookmark>, ApiError>;

    async fn delete_bookmark(&self, bookmark_id: i64) -> Result<(), ApiError>;

    // ========== Audio ==========
    /// Narration of the conversation, up to `end_message_id` when given.
    async fn conversation_audio(
        &self,
        tree_id: i64,
        end_message_id: Option<i64>,
    ) -> Result<Bytes, ApiError>;

    /// Transcribe a WAV recording.
    async fn transcribe_audio(&self, wav: Bytes) -> Result<String, ApiError>;
}
