use std::sync::Arc;

use chrono::Utc;
use gpui::*;
use gpui_tokio_bridge::Tokio;
use nutrilens_llm::{ChatRequest, LlmProvider, PendingReply, ReplyStream, ReplyWorker, Turn};

use crate::assistant::events::{DraftRestored, SendFailed};
use crate::assistant::message::{Message, Role, SendTicket};
use crate::assistant::mode::AssistantMode;
use crate::assistant::send::{
    ConversationState, PendingSend, ReplyBuffer, SendFailure, SendRejected,
};

const NO_PROVIDER_REASON: &str = "no API key is configured";

/// The provider to ask and how, or why there is none.
#[derive(Clone)]
pub struct ProviderSelection {
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub model_id: String,
    pub max_tokens: Option<u64>,
    pub error: Option<String>,
}

impl ProviderSelection {
    pub fn unavailable(model_id: impl Into<String>, error: Option<String>) -> Self {
        Self {
            provider: None,
            model_id: model_id.into(),
            max_tokens: None,
            error,
        }
    }
}

/// Request for `pending`: every message before its prompt as history.
pub fn build_chat_request(
    state: &ConversationState,
    pending: &PendingSend,
    selection: &ProviderSelection,
    mode: AssistantMode,
) -> ChatRequest {
    let history = state
        .history_before(pending)
        .iter()
        .map(|message| match message.role {
            Role::User => Turn::user(message.content.clone()),
            Role::Assistant => Turn::assistant(message.content.clone()),
        });

    ChatRequest::new(selection.model_id.clone(), pending.prompt.clone())
        .with_preamble(mode.preamble())
        .with_history(history)
        .with_max_tokens(selection.max_tokens)
}

/// Owns the conversation and drives provider requests for it.
pub struct ConversationStore {
    state: ConversationState,
    selection: ProviderSelection,
    mode: AssistantMode,
    worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    reader_task: Option<Task<()>>,
}

impl EventEmitter<SendFailed> for ConversationStore {}
impl EventEmitter<DraftRestored> for ConversationStore {}

impl ConversationStore {
    pub fn new(selection: ProviderSelection, mode: AssistantMode) -> Self {
        Self {
            state: ConversationState::new(),
            selection,
            mode,
            worker_task: None,
            reader_task: None,
        }
    }

    pub fn draft(&self) -> &str {
        self.state.draft()
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.state.set_draft(draft);
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn mode(&self) -> AssistantMode {
        self.mode
    }

    pub fn model_id(&self) -> &str {
        &self.selection.model_id
    }

    /// Swaps the provider. Any in-flight send is cancelled.
    pub fn set_provider(&mut self, selection: ProviderSelection, cx: &mut Context<Self>) {
        self.cancel(cx);
        self.selection = selection;
        cx.notify();
    }

    /// Switches the assistant mode. Any in-flight send is cancelled.
    pub fn set_mode(&mut self, mode: AssistantMode, cx: &mut Context<Self>) {
        if self.mode == mode {
            return;
        }

        self.cancel(cx);
        self.mode = mode;
        cx.notify();
    }

    /// Sends the current draft.
    pub fn send(&mut self, cx: &mut Context<Self>) -> Result<SendTicket, SendRejected> {
        let pending = self.state.begin_send(Utc::now())?;
        let ticket = pending.ticket;
        self.dispatch(pending, cx);
        cx.notify();
        Ok(ticket)
    }

    /// Re-issues the prompt of the failed send `ticket`.
    pub fn retry(
        &mut self,
        ticket: SendTicket,
        cx: &mut Context<Self>,
    ) -> Result<SendTicket, SendRejected> {
        let pending = self.state.begin_retry(ticket, Utc::now())?;
        tracing::info!(failed_ticket = ?ticket, retry_ticket = ?pending.ticket, "retrying send");
        let retry_ticket = pending.ticket;
        self.dispatch(pending, cx);
        cx.notify();
        Ok(retry_ticket)
    }

    /// Abandons the in-flight send. No failure is reported for it.
    pub fn cancel(&mut self, cx: &mut Context<Self>) {
        // Dropping the reader drops the event stream, which signals the worker to stop.
        self.worker_task = None;
        self.reader_task = None;

        let Some(pending) = self.state.cancel() else {
            return;
        };

        tracing::debug!(ticket = ?pending.ticket, "send cancelled");
        cx.emit(DraftRestored {
            draft: self.state.draft().to_string(),
        });
        cx.notify();
    }

    fn dispatch(&mut self, pending: PendingSend, cx: &mut Context<Self>) {
        let Some(provider) = self.selection.provider.clone() else {
            let reason = self
                .selection
                .error
                .clone()
                .unwrap_or_else(|| NO_PROVIDER_REASON.to_string());
            tracing::warn!(ticket = ?pending.ticket, reason = %reason, "send without provider");
            self.finish(
                pending.ticket,
                Err(SendFailure::Unavailable {
                    stage: "dispatch-provider",
                    reason,
                }),
                cx,
            );
            return;
        };

        let request = build_chat_request(&self.state, &pending, &self.selection, self.mode);
        tracing::info!(
            ticket = ?pending.ticket,
            provider_id = provider.id(),
            model_id = %request.model_id,
            history_len = request.history.len(),
            "dispatching send"
        );

        match provider.ask(request) {
            Ok(reply) => self.spawn_pipeline(pending.ticket, reply, cx),
            Err(error) => {
                tracing::error!(ticket = ?pending.ticket, error = %error, "failed to start provider stream");
                self.finish(
                    pending.ticket,
                    Err(SendFailure::Provider {
                        stage: "ask-provider",
                        message: error.to_string(),
                    }),
                    cx,
                );
            }
        }
    }

    fn spawn_pipeline(
        &mut self,
        ticket: SendTicket,
        reply: PendingReply,
        cx: &mut Context<Self>,
    ) {
        self.spawn_worker(reply.worker, cx);
        self.spawn_reader(ticket, reply.stream, cx);
    }

    fn spawn_worker(&mut self, worker: ReplyWorker, cx: &mut Context<Self>) {
        self.worker_task = Some(Tokio::spawn(cx, worker));
    }

    fn spawn_reader(
        &mut self,
        ticket: SendTicket,
        mut stream: ReplyStream,
        cx: &mut Context<Self>,
    ) {
        self.reader_task = Some(cx.spawn(async move |this, cx| {
            let mut reply = ReplyBuffer::new();
            while let Some(event) = stream.next().await {
                if let Some(outcome) = reply.push(event) {
                    let _ = this.update(cx, |this, cx| this.finish(ticket, outcome, cx));
                    return;
                }
            }

            let failure = reply.closed();
            let _ = this.update(cx, |this, cx| this.finish(ticket, Err(failure), cx));
        }));
    }

    fn finish(
        &mut self,
        ticket: SendTicket,
        outcome: Result<String, SendFailure>,
        cx: &mut Context<Self>,
    ) {
        if self.state.pending().map(|pending| pending.ticket) == Some(ticket) {
            self.worker_task = None;
            self.reader_task = None;
        }

        match outcome {
            Ok(reply) => {
                if self.state.complete(ticket, reply, Utc::now()) {
                    tracing::info!(ticket = ?ticket, revision = self.state.revision(), "send completed");
                } else {
                    tracing::debug!(ticket = ?ticket, "ignoring stale completion");
                }
            }
            Err(failure) => match self.state.fail(ticket, failure) {
                Some(notice) => {
                    tracing::warn!(ticket = ?ticket, failure = %notice.failure, "send failed");
                    cx.emit(SendFailed { notice });
                }
                None => tracing::debug!(ticket = ?ticket, "ignoring stale failure"),
            },
        }

        cx.notify();
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn selection(max_tokens: Option<u64>) -> ProviderSelection {
        ProviderSelection {
            max_tokens,
            ..ProviderSelection::unavailable("gpt-4o", None)
        }
    }

    fn started(state: &mut ConversationState, draft: &str) -> PendingSend {
        state.set_draft(draft);
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        match state.begin_send(now) {
            Ok(pending) => pending,
            Err(rejected) => panic!("send rejected: {rejected}"),
        }
    }

    #[::core::prelude::v1::test]
    fn request_carries_the_model_reply_cap() {
        let mut state = ConversationState::new();
        let pending = started(&mut state, "is this cereal salty?");

        let request = build_chat_request(
            &state,
            &pending,
            &selection(Some(400)),
            AssistantMode::HealthAnalysis,
        );

        assert_eq!(request.model_id, "gpt-4o");
        assert_eq!(request.max_tokens, Some(400));
        assert_eq!(request.preamble, AssistantMode::HealthAnalysis.preamble());
        assert_eq!(request.prompt, "is this cereal salty?");
        assert!(request.history.is_empty());
    }

    #[::core::prelude::v1::test]
    fn prompt_is_not_repeated_in_the_history() {
        let mut state = ConversationState::new();
        let first = started(&mut state, "sugar?");
        assert!(state.complete(first.ticket, "9 g".into(), first.sent_at));
        let second = started(&mut state, "and salt?");

        let request = build_chat_request(
            &state,
            &second,
            &selection(None),
            AssistantMode::Conversational,
        );

        assert_eq!(
            request.history,
            vec![Turn::user("sugar?"), Turn::assistant("9 g")]
        );
        assert_eq!(request.prompt, "and salt?");
        assert_eq!(request.max_tokens, None);
    }
}
