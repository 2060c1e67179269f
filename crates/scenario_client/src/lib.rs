pub mod api;
pub mod client_trait;
pub mod error;
pub mod session;
pub mod utils;

pub use api::client::ScenarioClient;
pub use api::models::{
    ContinueConversationRequest, CreateMessageRequest, SummarizedMessageRequest,
};
pub use client_trait::ScenarioApi;
pub use dialogue_core::Config;
pub use error::ApiError;
pub use session::{ScenarioSession, SessionError};
