//! Submit Turn use case
//!
//! Connects the conversation thread to the refinement orchestrator: a user
//! message goes in on the active branch, a graded assistant message comes
//! out under it.

use crate::agents::AgentError;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::ContextEntry;
use crate::ports::progress::ProgressNotifier;
use crate::session::{SessionContext, SessionError};
use crate::use_cases::run_refinement::{
    RefinementInput, RefinementOrchestrator, RunRefinementError,
};
use draftsmith_domain::{Attachment, DomainError, Message, MessageId, RefinementReport, Role};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Errors surfaced to the user for a turn
#[derive(Error, Debug)]
pub enum SubmitTurnError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    NotFound(#[from] DomainError),

    #[error("Refinement run failed: {0}")]
    RunFailed(#[source] AgentError),

    #[error("Run cancelled before any draft was graded")]
    Cancelled,

    #[error("The active message already has an answer; nothing to retry")]
    NothingToRetry,
}

impl SubmitTurnError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SubmitTurnError::Cancelled)
    }

    pub fn is_run_in_progress(&self) -> bool {
        matches!(self, SubmitTurnError::Session(SessionError::RunInProgress))
    }
}

impl From<RunRefinementError> for SubmitTurnError {
    fn from(err: RunRefinementError) -> Self {
        match err {
            RunRefinementError::RunFailed(e) => SubmitTurnError::RunFailed(e),
            RunRefinementError::Cancelled => SubmitTurnError::Cancelled,
        }
    }
}

/// A new user turn
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub prompt: String,
    pub attachments: Vec<Attachment>,
    /// Problems found while preparing the turn (e.g. dropped files)
    pub warnings: Vec<String>,
}

impl TurnRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>, warnings: Vec<String>) -> Self {
        self.attachments = attachments;
        self.warnings = warnings;
        self
    }
}

/// A committed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_message: Message,
    pub assistant_message: Message,
    pub report: RefinementReport,
}

impl TurnOutcome {
    pub fn warnings(&self) -> &[String] {
        self.assistant_message
            .metadata()
            .map(|m| m.warnings.as_slice())
            .unwrap_or_default()
    }
}

pub struct SubmitTurnUseCase {
    orchestrator: RefinementOrchestrator,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl SubmitTurnUseCase {
    pub fn new(orchestrator: RefinementOrchestrator) -> Self {
        Self {
            orchestrator,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Append the prompt on the active branch and answer it.
    ///
    /// On failure the thread ends at the new user message, which
    /// [`retry`](Self::retry) can answer later.
    pub async fn execute(
        &self,
        session: &mut SessionContext,
        request: TurnRequest,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        session.begin_run()?;
        let result = self.submit(session, request, progress, cancel).await;
        session.finish_run();
        result
    }

    /// Edit a past user message on a new branch and answer the edit.
    pub async fn edit_and_fork(
        &self,
        session: &mut SessionContext,
        user_message_id: MessageId,
        new_content: &str,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        session.begin_run()?;
        let result = self
            .fork(session, user_message_id, new_content, progress, cancel)
            .await;
        session.finish_run();
        result
    }

    /// Answer the active user message left unanswered by a failed run.
    ///
    /// Warnings gathered for the original turn are carried over.
    pub async fn retry(
        &self,
        session: &mut SessionContext,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        let user_id = match session.thread.active_leaf() {
            Some(leaf) if leaf.is_user() => leaf.id(),
            _ => return Err(SubmitTurnError::NothingToRetry),
        };
        session.begin_run()?;
        let warnings = session.take_warnings(user_id);
        let result = self
            .answer(session, user_id, warnings, progress, cancel)
            .await;
        session.finish_run();
        result
    }

    async fn submit(
        &self,
        session: &mut SessionContext,
        request: TurnRequest,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        let parent = session.thread.active_leaf_id();
        let user = session
            .thread
            .append(parent, Role::User, request.prompt, request.attachments)?;
        self.answer(session, user.id(), request.warnings, progress, cancel)
            .await
    }

    async fn fork(
        &self,
        session: &mut SessionContext,
        user_message_id: MessageId,
        new_content: &str,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        let edited = session.thread.fork_edit(user_message_id, new_content)?;
        info!(
            original = %user_message_id,
            message_id = %edited.id(),
            "Forked conversation at edited message"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "fork_created",
            json!({
                "original_id": user_message_id.to_string(),
                "message_id": edited.id().to_string(),
                "parent_id": edited.parent_id().map(|id| id.to_string()),
                "content": edited.content(),
            }),
        ));
        self.answer(session, edited.id(), Vec::new(), progress, cancel)
            .await
    }

    /// Run the orchestrator for `user_id` and commit the answer under it.
    async fn answer(
        &self,
        session: &mut SessionContext,
        user_id: MessageId,
        warnings: Vec<String>,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, SubmitTurnError> {
        let user = session
            .thread
            .get(user_id)
            .cloned()
            .ok_or(DomainError::MessageNotFound(user_id))?;

        let context = match user.parent_id() {
            Some(parent) => ContextEntry::from_path(session.thread.context_path(parent)?),
            None => Vec::new(),
        };

        let input = RefinementInput::new(user.content(), session.settings)
            .with_context(context)
            .with_attachments(user.attachments().to_vec());

        let report = match self.orchestrator.execute(input, progress, cancel).await {
            Ok(report) => report,
            Err(e) => {
                session.keep_warnings(user_id, warnings);
                return Err(e.into());
            }
        };

        let assistant = session.thread.append_assistant(
            Some(user_id),
            report.draft.clone(),
            report.status,
            report.metadata(warnings),
        )?;

        info!(
            message_id = %assistant.id(),
            status = %report.status,
            iterations = report.iterations,
            "Turn committed"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "turn_committed",
            json!({
                "user_id": user_id.to_string(),
                "message_id": assistant.id().to_string(),
                "status": report.status,
                "iterations": report.iterations,
                "content": assistant.content(),
            }),
        ));

        Ok(TurnOutcome {
            user_message: user,
            assistant_message: assistant,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::MockGateway;
    use crate::agents::AgentSet;
    use crate::config::RefinementParams;
    use crate::ports::llm_gateway::LlmGateway;
    use crate::ports::progress::NoProgress;
    use draftsmith_domain::{AgentModels, MessageStatus};

    /// Bypass mode keeps every turn to a single gateway call
    fn bypass_session() -> SessionContext {
        SessionContext::new(RefinementParams::default().with_quality_agents(false))
    }

    fn use_case(gateway: Arc<MockGateway>) -> SubmitTurnUseCase {
        let gateway: Arc<dyn LlmGateway> = gateway;
        let agents = AgentSet::llm(gateway, AgentModels::default());
        SubmitTurnUseCase::new(RefinementOrchestrator::new(agents))
    }

    #[tokio::test]
    async fn test_turn_commits_answer_under_prompt() {
        let gateway = Arc::new(MockGateway::replying(&["Tides follow the moon."]));
        let mut session = bypass_session();
        let outcome = use_case(gateway)
            .execute(
                &mut session,
                TurnRequest::new("Explain tides"),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.assistant_message.content(), "Tides follow the moon.");
        assert_eq!(
            outcome.assistant_message.parent_id(),
            Some(outcome.user_message.id())
        );
        assert_eq!(outcome.assistant_message.status(), Some(MessageStatus::Complete));
        assert_eq!(
            session.thread.active_leaf_id(),
            Some(outcome.assistant_message.id())
        );
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_second_turn_sees_first_as_context() {
        let gateway = Arc::new(MockGateway::replying(&["first answer", "second answer"]));
        let use_case = use_case(gateway.clone());
        let mut session = bypass_session();
        let cancel = CancellationToken::new();

        use_case
            .execute(&mut session, TurnRequest::new("first"), &NoProgress, &cancel)
            .await
            .unwrap();
        use_case
            .execute(&mut session, TurnRequest::new("second"), &NoProgress, &cancel)
            .await
            .unwrap();

        let requests = gateway.requests.lock().unwrap();
        assert!(requests[0].context.is_empty());
        let context: Vec<&str> = requests[1].context.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(context, vec!["first", "first answer"]);
        assert_eq!(requests[1].prompt, "second");
    }

    #[tokio::test]
    async fn test_failed_run_leaves_user_message_for_retry() {
        let gateway = Arc::new(MockGateway::new(vec![
            Err(crate::ports::llm_gateway::GatewayError::Timeout),
            Ok("recovered".to_string()),
        ]));
        let use_case = use_case(gateway);
        let mut session = bypass_session();
        let cancel = CancellationToken::new();

        let err = use_case
            .execute(&mut session, TurnRequest::new("hello"), &NoProgress, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitTurnError::RunFailed(_)));
        assert!(!session.is_in_flight());
        let leaf = session.thread.active_leaf().unwrap();
        assert!(leaf.is_user());
        assert_eq!(session.thread.len(), 1);

        let outcome = use_case
            .retry(&mut session, &NoProgress, &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.assistant_message.content(), "recovered");
        assert_eq!(session.thread.len(), 2);

        let err = use_case
            .retry(&mut session, &NoProgress, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitTurnError::NothingToRetry));
    }

    #[tokio::test]
    async fn test_edit_and_fork_hides_original_branch() {
        let gateway = Arc::new(MockGateway::replying(&["answer a", "answer b", "answer a2"]));
        let use_case = use_case(gateway.clone());
        let mut session = bypass_session();
        let cancel = CancellationToken::new();

        let first = use_case
            .execute(&mut session, TurnRequest::new("a"), &NoProgress, &cancel)
            .await
            .unwrap();
        let second = use_case
            .execute(&mut session, TurnRequest::new("b"), &NoProgress, &cancel)
            .await
            .unwrap();

        let forked = use_case
            .edit_and_fork(
                &mut session,
                second.user_message.id(),
                "b edited",
                &NoProgress,
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(
            forked.user_message.parent_id(),
            Some(first.assistant_message.id())
        );
        let context: Vec<String> = gateway.requests.lock().unwrap()[2]
            .context
            .iter()
            .map(|c| c.content.clone())
            .collect();
        assert_eq!(context, vec!["a", "answer a"]);

        // the original branch is still reachable
        let old_path = session
            .thread
            .context_path(second.assistant_message.id())
            .unwrap();
        assert_eq!(old_path.len(), 4);
        assert_eq!(
            session.thread.active_leaf_id(),
            Some(forked.assistant_message.id())
        );
    }

    #[tokio::test]
    async fn test_edit_unknown_message_is_not_found() {
        let gateway = Arc::new(MockGateway::replying(&[]));
        let mut session = bypass_session();
        let err = use_case(gateway)
            .edit_and_fork(
                &mut session,
                MessageId::new(),
                "x",
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitTurnError::NotFound(ref e) if e.is_not_found()));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn test_rejects_turn_while_in_flight() {
        let gateway = Arc::new(MockGateway::replying(&["unused"]));
        let mut session = bypass_session();
        session.begin_run().unwrap();
        let err = use_case(gateway)
            .execute(
                &mut session,
                TurnRequest::new("hello"),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_run_in_progress());
        assert!(session.thread.is_empty());
    }

    #[tokio::test]
    async fn test_warnings_stored_with_answer() {
        let gateway = Arc::new(MockGateway::replying(&["ok"]));
        let mut session = bypass_session();
        let request = TurnRequest::new("hi")
            .with_attachments(vec![], vec!["notes.pdf: Unsupported file format: pdf".to_string()]);
        let outcome = use_case(gateway)
            .execute(&mut session, request, &NoProgress, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_keeps_warnings_of_failed_turn() {
        let gateway = Arc::new(MockGateway::new(vec![
            Err(crate::ports::llm_gateway::GatewayError::Timeout),
            Ok("recovered".to_string()),
        ]));
        let use_case = use_case(gateway);
        let mut session = bypass_session();
        let cancel = CancellationToken::new();
        let request = TurnRequest::new("summarize")
            .with_attachments(vec![], vec!["scan.docx: unsupported file type, skipped".to_string()]);

        use_case
            .execute(&mut session, request, &NoProgress, &cancel)
            .await
            .unwrap_err();
        let outcome = use_case
            .retry(&mut session, &NoProgress, &cancel)
            .await
            .unwrap();

        assert_eq!(
            outcome.warnings(),
            ["scan.docx: unsupported file type, skipped".to_string()]
        );
    }
}
