use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dialogue_core::config::{Config, ProxyAuth};
use dialogue_core::{
    Bookmark, CaseBackground, CaseDetail, CaseSummary, CaseUpdated, CreatedMessage, NewBookmark,
    NewCase, NewSimulation, PathMessage, Simulation, TreeMessage, TreeResponse,
};
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Proxy, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::models::{
    ContinueConversationRequest, CreateMessageRequest, SummarizedMessageRequest,
    TranscriptionResponse,
};
use crate::client_trait::ScenarioApi;
use crate::error::ApiError;
use crate::utils::http_utils::{check_status, execute_request, read_json, send_request};

const CASE_NOT_FOUND: &str = "Case not found";
const SIMULATION_NOT_FOUND: &str = "Simulation not found";
const RECORDING_FILE_NAME: &str = "recording.wav";

fn apply_proxy_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    let Some(auth) = auth else {
        return proxy;
    };
    if auth.username.is_empty() {
        return proxy;
    }
    proxy.basic_auth(&auth.username, &auth.password)
}

/// HTTP adapter for the scenario backend.
#[derive(Debug, Clone)]
pub struct ScenarioClient {
    client: Arc<Client>,
    api_root: String,
}

impl ScenarioClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Self::build_http_client(config)?;
        Ok(Self::with_client(client, config.api_root()))
    }

    /// Use a prebuilt HTTP client against `api_root` (base URL plus `/api/v1`).
    pub fn with_client(client: Client, api_root: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            api_root: api_root.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Proxies come from the config only; the environment has already been
    /// folded into it.
    fn build_http_client(config: &Config) -> Result<Client, ApiError> {
        let mut builder = Client::builder();
        if config.http_proxy.is_empty() && config.https_proxy.is_empty() {
            builder = builder.no_proxy();
        }
        if !config.http_proxy.is_empty() {
            let mut proxy = Proxy::http(&config.http_proxy)?;
            proxy = apply_proxy_auth(proxy, config.http_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        if !config.https_proxy.is_empty() {
            let mut proxy = Proxy::https(&config.https_proxy)?;
            proxy = apply_proxy_auth(proxy, config.https_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: &'static str,
        not_found: Option<&'static str>,
    ) -> Result<Response, ApiError> {
        let response = execute_request(&self.client, method, self.url(path), body).await?;
        check_status(response, context, not_found)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &'static str,
        not_found: Option<&'static str>,
    ) -> Result<T, ApiError> {
        let response = self
            .call(Method::GET, path, None::<&()>, context, not_found)
            .await?;
        read_json(response, context).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &'static str,
        not_found: Option<&'static str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.call(method, path, Some(body), context, not_found).await?;
        read_json(response, context).await
    }

    /// Call an endpoint whose response body is ignored.
    async fn send_empty(
        &self,
        method: Method,
        path: &str,
        context: &'static str,
        not_found: Option<&'static str>,
    ) -> Result<(), ApiError> {
        self.call(method, path, None::<&()>, context, not_found)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ScenarioApi for ScenarioClient {
    async fn list_cases(&self) -> Result<Vec<CaseSummary>, ApiError> {
        self.get_json("/cases", "Failed to list cases", None).await
    }

    async fn get_case(&self, case_id: i64) -> Result<CaseDetail, ApiError> {
        self.get_json(
            &format!("/cases/{case_id}"),
            "Failed to get case",
            Some(CASE_NOT_FOUND),
        )
        .await
    }

    async fn create_case(&self, case: &NewCase) -> Result<CaseSummary, ApiError> {
        self.send_json(Method::POST, "/cases", case, "Failed to create case", None)
            .await
    }

    async fn update_case(
        &self,
        case_id: i64,
        background: &CaseBackground,
    ) -> Result<CaseUpdated, ApiError> {
        self.send_json(
            Method::PATCH,
            &format!("/cases/{case_id}"),
            background,
            "Failed to save case",
            Some(CASE_NOT_FOUND),
        )
        .await
    }

    async fn delete_case(&self, case_id: i64) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &format!("/cases/{case_id}"),
            "Failed to delete case",
            Some(CASE_NOT_FOUND),
        )
        .await
    }

    async fn create_simulation(
        &self,
        simulation: &NewSimulation,
    ) -> Result<Simulation, ApiError> {
        self.send_json(
            Method::POST,
            "/simulations",
            simulation,
            "Failed to create simulation",
            None,
        )
        .await
    }

    async fn get_simulation(&self, simulation_id: i64) -> Result<Simulation, ApiError> {
        self.get_json(
            &format!("/simulations/{simulation_id}"),
            "Failed to get simulation",
            Some(SIMULATION_NOT_FOUND),
        )
        .await
    }

    async fn load_simulation_tree(
        &self,
        simulation_id: i64,
    ) -> Result<Vec<TreeMessage>, ApiError> {
        self.get_json(
            &format!("/trees/{simulation_id}/messages"),
            "Failed to load simulation tree",
            Some(SIMULATION_NOT_FOUND),
        )
        .await
    }

    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<TreeResponse, ApiError> {
        debug!(
            "Continuing case {} tree {} from {:?} (refresh: {})",
            request.case_id, request.tree_id, request.message_id, request.refresh
        );
        self.send_json(
            Method::POST,
            "/continue-conversation",
            request,
            "Failed to continue conversation",
            Some(CASE_NOT_FOUND),
        )
        .await
    }

    async fn create_message(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<CreatedMessage, ApiError> {
        self.send_json(
            Method::POST,
            "/messages/create",
            request,
            "Failed to create message",
            None,
        )
        .await
    }

    async fn create_summarized_message(
        &self,
        request: &SummarizedMessageRequest,
    ) -> Result<CreatedMessage, ApiError> {
        self.send_json(
            Method::POST,
            "/messages/create-summarized",
            request,
            "Failed to create message",
            None,
        )
        .await
    }

    async fn select_message(&self, message_id: i64) -> Result<(), ApiError> {
        self.send_empty(
            Method::PATCH,
            &format!("/messages/{message_id}/select"),
            "Failed to select message",
            None,
        )
        .await
    }

    async fn trim_messages_after(&self, message_id: i64) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &format!("/messages/trim-after/{message_id}"),
            "Failed to trim messages",
            None,
        )
        .await
    }

    async fn message_children(&self, message_id: i64) -> Result<Vec<TreeMessage>, ApiError> {
        self.get_json(
            &format!("/messages/{message_id}/children"),
            "Failed to get message children",
            None,
        )
        .await
    }

    async fn selected_messages_path(
        &self,
        start_id: i64,
        end_id: i64,
    ) -> Result<Vec<PathMessage>, ApiError> {
        self.get_json(
            &format!("/messages/selected-path?start_id={start_id}&end_id={end_id}"),
            "Failed to get selected path",
            None,
        )
        .await
    }

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, ApiError> {
        self.send_json(
            Method::POST,
            "/bookmarks",
            bookmark,
            "Failed to create bookmark",
            None,
        )
        .await
    }

    async fn list_bookmarks(&self, simulation_id: i64) -> Result<Vec<Bookmark>, ApiError> {
        self.get_json(
            &format!("/bookmarks/{simulation_id}"),
            "Failed to get bookmarks",
            Some(SIMULATION_NOT_FOUND),
        )
        .await
    }

    async fn delete_bookmark(&self, bookmark_id: i64) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &format!("/bookmarks/{bookmark_id}"),
            "Failed to delete bookmark",
            None,
        )
        .await
    }

    async fn conversation_audio(
        &self,
        tree_id: i64,
        end_message_id: Option<i64>,
    ) -> Result<Bytes, ApiError> {
        let path = match end_message_id {
            Some(end) => format!("/get-conversation-audio/{tree_id}?end_message_id={end}"),
            None => format!("/get-conversation-audio/{tree_id}"),
        };
        let response = self
            .call(
                Method::GET,
                &path,
                None::<&()>,
                "Failed to get conversation audio",
                None,
            )
            .await?;
        Ok(response.bytes().await?)
    }

    async fn transcribe_audio(&self, wav: Bytes) -> Result<String, ApiError> {
        const CONTEXT: &str = "Transcription failed";
        let part = Part::bytes(wav.to_vec())
            .file_name(RECORDING_FILE_NAME)
            .mime_str("audio/wav")?;
        let form = Form::new().part("audio_file", part);
        let request = self
            .client
            .post(self.url("/transcribe-audio"))
            .multipart(form);

        let response = check_status(send_request(request).await?, CONTEXT, None)?;
        let transcription: TranscriptionResponse = read_json(response, CONTEXT).await?;
        Ok(transcription.message)
    }
}
