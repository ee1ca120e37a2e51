use chrono::{DateTime, Utc};
use nutrilens_llm::ReplyEvent;
use snafu::Snafu;

use crate::assistant::message::{Message, MessageId, SendTicket};

pub const SEND_FAILURE_TITLE: &str = "Error sending message";
pub const SEND_FAILURE_DESCRIPTION: &str = "Failed to send message. Click to retry.";

/// Why a send did not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SendFailure {
    #[snafu(display("assistant is unavailable on `{stage}`: {reason}"))]
    Unavailable { stage: &'static str, reason: String },
    #[snafu(display("assistant request failed on `{stage}`: {message}"))]
    Provider { stage: &'static str, message: String },
    #[snafu(display("assistant reply ended before completion on `{stage}`"))]
    Interrupted { stage: &'static str },
}

/// Why a send or retry request was refused before anything was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
pub enum SendRejected {
    #[snafu(display("message is empty"))]
    EmptyDraft,
    #[snafu(display("a message is already being sent"))]
    InFlight,
    #[snafu(display("there is no failed message to retry"))]
    NothingToRetry,
}

/// The one request in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub ticket: SendTicket,
    /// The user message this send answers.
    pub message_id: MessageId,
    pub prompt: String,
    pub sent_at: DateTime<Utc>,
}

/// The last request that failed, kept for a manual retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSend {
    pub ticket: SendTicket,
    pub message_id: MessageId,
    pub prompt: String,
    pub failure: SendFailure,
}

/// User-visible summary of one failed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub title: &'static str,
    pub description: &'static str,
    /// Ticket of the failed attempt; retrying it is allowed once.
    pub ticket: SendTicket,
    pub failure: SendFailure,
}

/// Message sequence plus draft and send lifecycle, free of any UI types.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    draft: String,
    revision: u64,
    next_message_id: u64,
    next_ticket: u64,
    pending: Option<PendingSend>,
    failed: Option<FailedSend>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Bumped whenever the message sequence changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingSend> {
        self.pending.as_ref()
    }

    pub fn failed(&self) -> Option<&FailedSend> {
        self.failed.as_ref()
    }

    /// Posts the current draft as a user message and starts sending it.
    pub fn begin_send(&mut self, now: DateTime<Utc>) -> Result<PendingSend, SendRejected> {
        if self.pending.is_some() {
            return Err(SendRejected::InFlight);
        }

        let prompt = self.draft.trim().to_string();
        if prompt.is_empty() {
            return Err(SendRejected::EmptyDraft);
        }

        self.draft.clear();
        self.failed = None;
        let message_id = self.alloc_message_id();
        self.messages
            .push(Message::user(message_id, prompt.clone(), now));
        self.bump();
        Ok(self.start(message_id, prompt, now))
    }

    /// Re-issues the prompt of the failed attempt `ticket`. Its user message is already posted.
    ///
    /// Only the most recent failure can be retried, and only once.
    pub fn begin_retry(
        &mut self,
        ticket: SendTicket,
        now: DateTime<Utc>,
    ) -> Result<PendingSend, SendRejected> {
        if self.pending.is_some() {
            return Err(SendRejected::InFlight);
        }

        let Some(failed) = self.failed.take_if(|failed| failed.ticket == ticket) else {
            return Err(SendRejected::NothingToRetry);
        };

        Ok(self.start(failed.message_id, failed.prompt, now))
    }

    /// Posts the assistant reply. Returns false for a stale ticket.
    pub fn complete(&mut self, ticket: SendTicket, reply: String, now: DateTime<Utc>) -> bool {
        if self.pending.take_if(|pending| pending.ticket == ticket).is_none() {
            return false;
        }

        let id = self.alloc_message_id();
        self.messages.push(Message::assistant(id, reply, now));
        self.bump();
        true
    }

    /// Records a failure. Returns the notice to show, or `None` for a stale ticket.
    pub fn fail(&mut self, ticket: SendTicket, failure: SendFailure) -> Option<FailureNotice> {
        let pending = self.pending.take_if(|pending| pending.ticket == ticket)?;

        self.failed = Some(FailedSend {
            ticket,
            message_id: pending.message_id,
            prompt: pending.prompt,
            failure: failure.clone(),
        });

        Some(FailureNotice {
            title: SEND_FAILURE_TITLE,
            description: SEND_FAILURE_DESCRIPTION,
            ticket,
            failure,
        })
    }

    /// Abandons the in-flight send without a notice and takes its user message back.
    ///
    /// The prompt goes back into the draft unless the user already typed something new.
    pub fn cancel(&mut self) -> Option<PendingSend> {
        let pending = self.pending.take()?;
        let before = self.messages.len();
        self.messages
            .retain(|message| message.id != pending.message_id);
        if self.messages.len() != before {
            self.bump();
        }
        if self.draft.trim().is_empty() {
            self.draft = pending.prompt.clone();
        }
        Some(pending)
    }

    /// Messages the model should see as context for `pending`, oldest first.
    pub fn history_before(&self, pending: &PendingSend) -> &[Message] {
        let end = self
            .messages
            .iter()
            .position(|message| message.id == pending.message_id)
            .unwrap_or(self.messages.len());
        &self.messages[..end]
    }

    fn start(&mut self, message_id: MessageId, prompt: String, now: DateTime<Utc>) -> PendingSend {
        self.next_ticket = self.next_ticket.saturating_add(1);
        let pending = PendingSend {
            ticket: SendTicket::new(self.next_ticket),
            message_id,
            prompt,
            sent_at: now,
        };
        self.pending = Some(pending.clone());
        pending
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    fn alloc_message_id(&mut self) -> MessageId {
        self.next_message_id = self.next_message_id.saturating_add(1);
        MessageId::new(self.next_message_id)
    }
}

/// Folds provider stream events into one reply.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    text: String,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the outcome once a terminal event arrives.
    ///
    /// Reasoning fragments are not part of the visible reply.
    pub fn push(&mut self, event: ReplyEvent) -> Option<Result<String, SendFailure>> {
        match event {
            ReplyEvent::Text(chunk) => {
                self.text.push_str(&chunk);
                None
            }
            ReplyEvent::Reasoning(_) => None,
            ReplyEvent::Finished => Some(Ok(std::mem::take(&mut self.text))),
            ReplyEvent::Failed(message) => Some(Err(SendFailure::Provider {
                stage: "provider-stream",
                message,
            })),
        }
    }

    /// Outcome when the stream closed without a terminal event.
    pub fn closed(self) -> SendFailure {
        SendFailure::Interrupted {
            stage: "provider-stream-closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::assistant::message::Role;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0)
            .single()
            .unwrap_or_default()
    }

    fn provider_failure() -> SendFailure {
        SendFailure::Provider {
            stage: "test",
            message: "503".to_string(),
        }
    }

    #[test]
    fn send_posts_the_user_message_before_the_reply_arrives() {
        let mut state = ConversationState::new();
        state.set_draft("  Is palm oil bad?  ");

        let pending = state.begin_send(at(0)).ok();
        assert!(state.is_loading());
        assert_eq!(state.draft(), "");
        assert_eq!(state.revision(), 1);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.messages()[0].content, "Is palm oil bad?");

        let Some(pending) = pending else {
            panic!("send should start");
        };
        assert_eq!(pending.message_id, state.messages()[0].id);
        assert_eq!(pending.prompt, "Is palm oil bad?");
        assert!(state.history_before(&pending).is_empty());
        assert!(state.complete(pending.ticket, "It is high in saturated fat.".into(), at(1)));

        assert!(!state.is_loading());
        let roles = state
            .messages()
            .iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(state.messages()[0].timestamp, at(0));
        assert_eq!(state.messages()[1].timestamp, at(1));
        assert!(state.messages()[0].id < state.messages()[1].id);
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn blank_draft_is_rejected() {
        let mut state = ConversationState::new();
        state.set_draft("   ");

        assert_eq!(state.begin_send(at(0)), Err(SendRejected::EmptyDraft));
        assert!(!state.is_loading());
    }

    #[test]
    fn second_send_while_loading_is_rejected() {
        let mut state = ConversationState::new();
        state.set_draft("first");
        assert!(state.begin_send(at(0)).is_ok());

        state.set_draft("second");
        assert_eq!(state.begin_send(at(0)), Err(SendRejected::InFlight));
        assert_eq!(state.draft(), "second");
    }

    #[test]
    fn failure_yields_exactly_one_notice_and_retry_reissues_the_prompt() {
        let mut state = ConversationState::new();
        state.set_draft("sodium in this soup?");
        let Ok(first) = state.begin_send(at(0)) else {
            panic!("send should start");
        };

        let notice = state.fail(first.ticket, provider_failure());
        assert!(notice.is_some());
        assert_eq!(state.fail(first.ticket, provider_failure()), None);
        assert!(!state.is_loading());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::User);

        let Some(notice) = notice else {
            panic!("notice expected");
        };
        assert_eq!(notice.title, SEND_FAILURE_TITLE);
        assert_eq!(notice.description, SEND_FAILURE_DESCRIPTION);

        let Ok(retry) = state.begin_retry(notice.ticket, at(2)) else {
            panic!("retry should start");
        };
        assert_eq!(retry.prompt, "sodium in this soup?");
        assert_ne!(retry.ticket, first.ticket);
        assert_eq!(retry.message_id, first.message_id);
        assert_eq!(state.messages().len(), 1);

        assert!(state.complete(retry.ticket, "About 1.2g salt.".into(), at(3)));
        let roles = state
            .messages()
            .iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(state.failed(), None);
    }

    #[test]
    fn retry_is_allowed_once_per_failure() {
        let mut state = ConversationState::new();
        state.set_draft("fiber?");
        let Ok(first) = state.begin_send(at(0)) else {
            panic!("send should start");
        };
        let _ = state.fail(first.ticket, provider_failure());

        let Ok(retry) = state.begin_retry(first.ticket, at(1)) else {
            panic!("retry should start");
        };
        assert!(state.fail(retry.ticket, provider_failure()).is_some());

        assert_eq!(
            state.begin_retry(first.ticket, at(2)),
            Err(SendRejected::NothingToRetry)
        );
        assert!(state.begin_retry(retry.ticket, at(2)).is_ok());
    }

    #[test]
    fn new_send_discards_the_previous_failure() {
        let mut state = ConversationState::new();
        state.set_draft("one");
        let Ok(first) = state.begin_send(at(0)) else {
            panic!("send should start");
        };
        let _ = state.fail(first.ticket, provider_failure());

        state.set_draft("two");
        assert!(state.begin_send(at(1)).is_ok());
        assert_eq!(state.failed(), None);
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let mut state = ConversationState::new();
        state.set_draft("protein?");
        let Ok(pending) = state.begin_send(at(0)) else {
            panic!("send should start");
        };
        let stale = SendTicket::new(pending.ticket.0 + 40);

        assert!(!state.complete(stale, "late".into(), at(1)));
        assert_eq!(state.fail(stale, provider_failure()), None);
        assert!(state.is_loading());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.revision(), 1);
    }

    #[test]
    fn cancel_restores_the_prompt_without_a_notice() {
        let mut state = ConversationState::new();
        state.set_draft("calories?");
        let Ok(pending) = state.begin_send(at(0)) else {
            panic!("send should start");
        };

        assert_eq!(state.cancel().map(|pending| pending.ticket), Some(pending.ticket));
        assert_eq!(state.draft(), "calories?");
        assert!(state.messages().is_empty());
        assert_eq!(state.revision(), 2);
        assert_eq!(state.failed(), None);
        assert!(!state.complete(pending.ticket, "late".into(), at(1)));
    }

    #[test]
    fn history_excludes_the_prompt_being_answered() {
        let mut state = ConversationState::new();
        state.set_draft("sugar?");
        let Ok(first) = state.begin_send(at(0)) else {
            panic!("send should start");
        };
        assert!(state.complete(first.ticket, "9 g".into(), at(1)));

        state.set_draft("and salt?");
        let Ok(second) = state.begin_send(at(2)) else {
            panic!("send should start");
        };

        let history = state
            .history_before(&second)
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(history, vec!["sugar?", "9 g"]);
    }

    #[test]
    fn reply_buffer_concatenates_deltas_until_done() {
        let mut buffer = ReplyBuffer::new();

        assert_eq!(buffer.push(ReplyEvent::Text("Low ".into())), None);
        assert_eq!(
            buffer.push(ReplyEvent::Reasoning("thinking".into())),
            None
        );
        assert_eq!(buffer.push(ReplyEvent::Text("sugar.".into())), None);
        assert_eq!(
            buffer.push(ReplyEvent::Finished),
            Some(Ok("Low sugar.".to_string()))
        );
    }

    #[test]
    fn reply_buffer_maps_errors_to_send_failures() {
        let mut buffer = ReplyBuffer::new();

        assert_eq!(
            buffer.push(ReplyEvent::Failed("rate limited".into())),
            Some(Err(SendFailure::Provider {
                stage: "provider-stream",
                message: "rate limited".to_string(),
            }))
        );
        assert!(matches!(
            ReplyBuffer::new().closed(),
            SendFailure::Interrupted { .. }
        ));
    }
}
