//! Scenario session - Drives one simulation page against the backend
//!
//! Every operation issues a ticket from the page machine, awaits the
//! adapter, and folds the result back in through `handle_event`. A failed
//! call leaves the tree as it was.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use dialogue_core::{
    encode_wav, Bookmark, CapturedAudio, Config, DialogueNode, NewBookmark, NewSimulation, NodeId,
    Simulation,
};
use log::{info, warn};
use scenario_state::{
    RequestTicket, ScenarioEvent, ScenarioMachine, ScenarioState, TransitionError,
};
use thiserror::Error;

use crate::api::models::{ContinueConversationRequest, SummarizedMessageRequest};
use crate::client_trait::ScenarioApi;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Node {0} has not been stored yet")]
    Unpersisted(NodeId),

    #[error("No simulation is open")]
    NotOpen,

    #[error("Simulation {0} has no messages")]
    EmptySimulation(i64),

    #[error("Statement is empty")]
    EmptyStatement,

    #[error("Recording is empty")]
    EmptyRecording,
}

pub struct ScenarioSession<A: ScenarioApi + ?Sized> {
    api: Arc<A>,
    machine: ScenarioMachine,
    simulation: Option<Simulation>,
    summary_word_count: u32,
}

impl<A: ScenarioApi + ?Sized> ScenarioSession<A> {
    pub fn new(api: Arc<A>, config: &Config) -> Self {
        Self {
            api,
            machine: ScenarioMachine::new(),
            simulation: None,
            summary_word_count: config.summary_word_count,
        }
    }

    pub fn machine(&self) -> &ScenarioMachine {
        &self.machine
    }

    pub fn state(&self) -> &ScenarioState {
        self.machine.state()
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    /// Ids of every node on a path to a bookmark.
    pub fn bookmarked_ids(&self) -> HashSet<NodeId> {
        self.machine.bookmarked_ids()
    }

    // ========== Loading ==========

    /// Create a simulation, generate its opening and open it.
    pub async fn start(&mut self, simulation: &NewSimulation) -> Result<(), SessionError> {
        let created = self.api.create_simulation(simulation).await?;
        info!(
            "Created simulation {} for case {}",
            created.id, created.case_id
        );
        let request = ContinueConversationRequest {
            case_id: created.case_id,
            tree_id: created.id,
            message_id: None,
            refresh: false,
        };
        self.api
            .continue_conversation(&request)
            .await?
            .into_branches()
            .map_err(ApiError::from)?;
        self.open(created.id).await
    }

    /// Load a simulation and its bookmarks, replacing whatever was open.
    ///
    /// Bookmarks failing to load does not fail the page.
    pub async fn open(&mut self, simulation_id: i64) -> Result<(), SessionError> {
        if self.simulation.is_some() {
            self.close();
        }

        let ticket = self.machine.begin_load();
        let simulation = match self.api.get_simulation(simulation_id).await {
            Ok(simulation) => simulation,
            Err(err) => return Err(self.load_failed(ticket, err.into())),
        };
        self.simulation = Some(simulation);
        self.fetch_tree(ticket, simulation_id).await?;

        if let Err(err) = self.refresh_bookmarks().await {
            warn!("Bookmarks unavailable for simulation {}: {}", simulation_id, err);
        }
        Ok(())
    }

    /// Leave the page. Responses still in flight are dropped.
    pub fn close(&mut self) {
        self.machine.navigate_away();
        self.simulation = None;
    }

    async fn reload(&mut self) -> Result<(), SessionError> {
        let simulation_id = self.require_simulation()?.id;
        let ticket = self.machine.begin_load();
        self.fetch_tree(ticket, simulation_id).await
    }

    async fn fetch_tree(
        &mut self,
        ticket: RequestTicket,
        simulation_id: i64,
    ) -> Result<(), SessionError> {
        let messages = match self.api.load_simulation_tree(simulation_id).await {
            Ok(messages) => messages,
            Err(err) => return Err(self.load_failed(ticket, err.into())),
        };
        let Some(tree) = DialogueNode::from_messages(&messages) else {
            return Err(self.load_failed(ticket, SessionError::EmptySimulation(simulation_id)));
        };
        info!(
            "Loaded simulation {} with {} nodes",
            simulation_id,
            tree.node_count()
        );
        self.machine
            .handle_event(ScenarioEvent::TreeLoaded { ticket, tree })?;
        Ok(())
    }

    fn load_failed(&mut self, ticket: RequestTicket, err: SessionError) -> SessionError {
        self.report(ScenarioEvent::LoadFailed {
            ticket,
            error: err.to_string(),
        });
        err
    }

    // ========== Turns ==========

    /// Generate the next statements under the selected leaf.
    ///
    /// With `refresh` the leaf's existing children are trimmed server-side
    /// first and the tree is re-fetched afterwards.
    pub async fn generate(&mut self, refresh: bool) -> Result<(), SessionError> {
        let (case_id, tree_id) = {
            let simulation = self.require_simulation()?;
            (simulation.case_id, simulation.id)
        };
        let leaf_id = self.persisted_leaf()?;
        let ticket = self.machine.begin_generation()?;

        if refresh {
            if let Err(err) = self.api.trim_messages_after(leaf_id).await {
                return Err(self.generation_failed(ticket, err));
            }
        }

        let request = ContinueConversationRequest {
            case_id,
            tree_id,
            message_id: Some(leaf_id),
            refresh,
        };
        let outcome = match self.api.continue_conversation(&request).await {
            Ok(response) => response.into_branches().map_err(ApiError::from),
            Err(err) => Err(err),
        };
        let branches = match outcome {
            Ok(branches) => branches,
            Err(err) => {
                let err = self.generation_failed(ticket, err);
                if refresh {
                    // The trim already happened server-side.
                    if let Err(reload_err) = self.reload().await {
                        warn!("Could not re-fetch trimmed tree: {}", reload_err);
                    }
                }
                return Err(err);
            }
        };

        if refresh {
            return self.reload().await;
        }

        self.machine.handle_event(ScenarioEvent::BranchesGenerated {
            ticket,
            parent_id: NodeId::Persisted(leaf_id),
            branches,
        })?;

        self.reconcile_generated(ticket, leaf_id).await
    }

    /// Adopt stored ids for the generated branches, one level at a time,
    /// descending into every stored node that still has pending children.
    async fn reconcile_generated(
        &mut self,
        ticket: RequestTicket,
        leaf_id: i64,
    ) -> Result<(), SessionError> {
        let mut parents = VecDeque::from([leaf_id]);
        while let Some(parent) = parents.pop_front() {
            let children = match self.api.message_children(parent).await {
                Ok(children) => children,
                Err(err) => {
                    warn!("Keeping placeholder ids under {}: {}", parent, err);
                    continue;
                }
            };
            let parent_id = NodeId::Persisted(parent);
            self.machine.handle_event(ScenarioEvent::BranchesReconciled {
                ticket,
                parent_id: parent_id.clone(),
                children,
            })?;

            if let Some(node) = self.machine.tree().and_then(|tree| tree.find(&parent_id)) {
                parents.extend(
                    node.children
                        .iter()
                        .filter(|child| child.children.iter().any(|c| c.id.is_pending()))
                        .filter_map(|child| child.id.persisted()),
                );
            }
        }
        Ok(())
    }

    fn generation_failed(&mut self, ticket: RequestTicket, err: ApiError) -> SessionError {
        self.report(ScenarioEvent::GenerationFailed {
            ticket,
            error: err.to_string(),
        });
        err.into()
    }

    /// Make `node_id` the end of the active path.
    pub async fn choose(&mut self, node_id: &NodeId) -> Result<(), SessionError> {
        let message_id = node_id
            .persisted()
            .ok_or_else(|| SessionError::Unpersisted(node_id.clone()))?;
        let ticket = self.machine.begin_selection(node_id)?;

        if let Err(err) = self.api.select_message(message_id).await {
            self.report(ScenarioEvent::SelectionFailed {
                ticket,
                error: err.to_string(),
            });
            return Err(err.into());
        }
        self.machine.handle_event(ScenarioEvent::NodeSelected {
            ticket,
            node_id: node_id.clone(),
        })?;
        Ok(())
    }

    /// Store a typed statement under the selected leaf. The backend shortens
    /// it to the configured word count.
    pub async fn submit_statement(&mut self, text: &str) -> Result<NodeId, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyStatement);
        }
        let simulation_id = self.require_simulation()?.id;
        let parent_id = self.persisted_leaf()?;
        let role = self
            .machine
            .tree()
            .map(|tree| tree.next_party())
            .unwrap_or_default()
            .as_role();
        let ticket = self.machine.begin_submission()?;

        let request = SummarizedMessageRequest {
            simulation_id,
            parent_id: Some(parent_id),
            user_input: text.to_string(),
            role: role.to_string(),
            desired_length: self.summary_word_count,
        };
        let message = match self.api.create_summarized_message(&request).await {
            Ok(message) => message,
            Err(err) => {
                self.report(ScenarioEvent::SubmissionFailed {
                    ticket,
                    error: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let node_id = NodeId::Persisted(message.id);
        self.machine.handle_event(ScenarioEvent::MessageCreated {
            ticket,
            parent_id: NodeId::Persisted(parent_id),
            message,
        })?;
        Ok(node_id)
    }

    // ========== Bookmarks ==========

    pub async fn refresh_bookmarks(&mut self) -> Result<(), SessionError> {
        let simulation_id = self.require_simulation()?.id;
        let ticket = self.machine.begin_bookmarks();
        let bookmarks = self.api.list_bookmarks(simulation_id).await?;
        self.machine
            .handle_event(ScenarioEvent::BookmarksLoaded { ticket, bookmarks })?;
        Ok(())
    }

    /// Bookmark the selected leaf under `name`.
    pub async fn bookmark(&mut self, name: &str) -> Result<Bookmark, SessionError> {
        let simulation_id = self.require_simulation()?.id;
        let message_id = self.persisted_leaf()?;
        let request = NewBookmark {
            simulation_id,
            message_id,
            name: name.trim().to_string(),
        };
        let bookmark = self.api.create_bookmark(&request).await?;
        self.machine.handle_event(ScenarioEvent::BookmarkAdded {
            bookmark: bookmark.clone(),
        })?;
        Ok(bookmark)
    }

    pub async fn remove_bookmark(&mut self, bookmark_id: i64) -> Result<(), SessionError> {
        self.api.delete_bookmark(bookmark_id).await?;
        self.machine
            .handle_event(ScenarioEvent::BookmarkRemoved { bookmark_id })?;
        Ok(())
    }

    // ========== Audio ==========

    /// Narration of the conversation, optionally ending at the selected leaf.
    pub async fn conversation_audio(&self, up_to_leaf: bool) -> Result<Bytes, SessionError> {
        let tree_id = self.require_simulation()?.id;
        let end_message_id = if up_to_leaf {
            Some(self.persisted_leaf()?)
        } else {
            None
        };
        Ok(self.api.conversation_audio(tree_id, end_message_id).await?)
    }

    /// Transcribe a recording so it can be submitted as a statement.
    pub async fn transcribe(&self, audio: &CapturedAudio) -> Result<String, SessionError> {
        if audio.samples.is_empty() {
            return Err(SessionError::EmptyRecording);
        }
        let wav = encode_wav(audio);
        info!(
            "Transcribing {:.1}s of audio ({} bytes)",
            audio.duration_secs(),
            wav.len()
        );
        Ok(self.api.transcribe_audio(wav).await?)
    }

    // ========== Helpers ==========

    fn require_simulation(&self) -> Result<&Simulation, SessionError> {
        self.simulation.as_ref().ok_or(SessionError::NotOpen)
    }

    fn persisted_leaf(&self) -> Result<i64, SessionError> {
        let state = self.machine.state();
        let leaf = state
            .selected_leaf()
            .ok_or_else(|| TransitionError::NotReady(state.load.clone()))?;
        leaf.id
            .persisted()
            .ok_or_else(|| SessionError::Unpersisted(leaf.id.clone()))
    }

    /// Apply a failure event; these never fail to apply.
    fn report(&mut self, event: ScenarioEvent) {
        if let Err(err) = self.machine.handle_event(event) {
            warn!("Could not record failure: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dialogue_core::{
        CaseBackground, CaseDetail, CaseSummary, CaseUpdated, CreatedMessage, NewCase, PathMessage,
        TreeMessage, TreeResponse,
    };
    use reqwest::StatusCode;
    use scenario_state::{LoadPhase, TurnKind};

    use super::*;
    use crate::api::models::CreateMessageRequest;

    /// In-memory backend: one simulation whose root awaits Party A.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<&'static str>>,
        submit_status: Option<StatusCode>,
    }

    impl FakeApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn unsupported<T>() -> Result<T, ApiError> {
        Err(ApiError::Status {
            context: "unsupported",
            status: StatusCode::NOT_IMPLEMENTED,
        })
    }

    #[async_trait]
    impl ScenarioApi for FakeApi {
        async fn list_cases(&self) -> Result<Vec<CaseSummary>, ApiError> {
            unsupported()
        }
        async fn get_case(&self, _: i64) -> Result<CaseDetail, ApiError> {
            unsupported()
        }
        async fn create_case(&self, _: &NewCase) -> Result<CaseSummary, ApiError> {
            unsupported()
        }
        async fn update_case(&self, _: i64, _: &CaseBackground) -> Result<CaseUpdated, ApiError> {
            unsupported()
        }
        async fn delete_case(&self, _: i64) -> Result<(), ApiError> {
            unsupported()
        }
        async fn create_simulation(&self, _: &NewSimulation) -> Result<Simulation, ApiError> {
            unsupported()
        }
        async fn get_simulation(&self, simulation_id: i64) -> Result<Simulation, ApiError> {
            self.record("get_simulation");
            Ok(Simulation {
                id: simulation_id,
                headline: "Wage claim".to_string(),
                brief: String::new(),
                created_at: None,
                case_id: 1,
            })
        }
        async fn load_simulation_tree(&self, _: i64) -> Result<Vec<TreeMessage>, ApiError> {
            self.record("load_simulation_tree");
            Ok(vec![TreeMessage {
                id: 10,
                role: "B".to_string(),
                content: "Your hours were recorded correctly.".to_string(),
                selected: true,
                children: vec![],
            }])
        }
        async fn continue_conversation(
            &self,
            _: &ContinueConversationRequest,
        ) -> Result<TreeResponse, ApiError> {
            unsupported()
        }
        async fn create_message(&self, _: &CreateMessageRequest) -> Result<CreatedMessage, ApiError> {
            unsupported()
        }
        async fn create_summarized_message(
            &self,
            request: &SummarizedMessageRequest,
        ) -> Result<CreatedMessage, ApiError> {
            self.record("create_summarized_message");
            if let Some(status) = self.submit_status {
                return Err(ApiError::Status {
                    context: "Failed to create message",
                    status,
                });
            }
            Ok(CreatedMessage {
                id: 11,
                content: request.user_input.clone(),
                role: request.role.clone(),
                selected: true,
                simulation_id: Some(request.simulation_id),
                parent_id: request.parent_id,
            })
        }
        async fn select_message(&self, _: i64) -> Result<(), ApiError> {
            unsupported()
        }
        async fn trim_messages_after(&self, _: i64) -> Result<(), ApiError> {
            unsupported()
        }
        async fn message_children(&self, _: i64) -> Result<Vec<TreeMessage>, ApiError> {
            unsupported()
        }
        async fn selected_messages_path(&self, _: i64, _: i64) -> Result<Vec<PathMessage>, ApiError> {
            unsupported()
        }
        async fn create_bookmark(&self, _: &NewBookmark) -> Result<Bookmark, ApiError> {
            unsupported()
        }
        async fn list_bookmarks(&self, _: i64) -> Result<Vec<Bookmark>, ApiError> {
            self.record("list_bookmarks");
            Ok(vec![])
        }
        async fn delete_bookmark(&self, _: i64) -> Result<(), ApiError> {
            unsupported()
        }
        async fn conversation_audio(&self, _: i64, _: Option<i64>) -> Result<Bytes, ApiError> {
            unsupported()
        }
        async fn transcribe_audio(&self, _: Bytes) -> Result<String, ApiError> {
            unsupported()
        }
    }

    fn session(api: FakeApi) -> (ScenarioSession<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(api);
        let session = ScenarioSession::new(Arc::clone(&api), &Config::default());
        (session, api)
    }

    #[test]
    fn failed_submission_restores_turn() {
        let (mut session, api) = session(FakeApi {
            submit_status: Some(StatusCode::SERVICE_UNAVAILABLE),
            ..FakeApi::default()
        });

        tokio_test::block_on(async {
            session.open(5).await.unwrap();
            let before = session.state().tree.clone();

            let err = session.submit_statement("I worked 50 hours").await.unwrap_err();
            assert_eq!(err.to_string(), "Failed to create message: Service Unavailable");
            assert_eq!(session.state().tree, before);
            assert_eq!(session.state().turn.kind(), TurnKind::PartyAAwaitingInput);
            assert_eq!(
                session.state().last_error.as_deref(),
                Some("Failed to create message: Service Unavailable")
            );
        });
        assert_eq!(
            api.calls(),
            vec![
                "get_simulation",
                "load_simulation_tree",
                "list_bookmarks",
                "create_summarized_message"
            ]
        );
    }

    #[test]
    fn blank_statement_is_rejected_locally() {
        let (mut session, api) = session(FakeApi::default());

        tokio_test::block_on(async {
            session.open(5).await.unwrap();
            assert!(matches!(
                session.submit_statement("   ").await,
                Err(SessionError::EmptyStatement)
            ));
        });
        assert!(!api.calls().contains(&"create_summarized_message"));
    }

    #[test]
    fn works_behind_trait_object() {
        let api: Arc<dyn ScenarioApi> = Arc::new(FakeApi::default());
        let mut session = ScenarioSession::new(api, &Config::default());

        tokio_test::block_on(async {
            session.open(5).await.unwrap();
            let id = session.submit_statement("I worked 50 hours").await.unwrap();
            assert_eq!(id, NodeId::Persisted(11));
        });
        assert_eq!(session.state().load, LoadPhase::Ready);
        assert_eq!(session.state().conversation().len(), 2);
    }
}
