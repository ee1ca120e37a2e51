use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};

use crate::provider::{
    BlankPromptSnafu, HttpClientSnafu, LlmProvider, MissingApiKeySnafu, PendingReply,
    ProviderConfig, ProviderError, ProviderResult, ReplyWorker,
};
use crate::request::{ChatRequest, Speaker, Turn};
use crate::stream::{CancelSignal, ReplyEvent, ReplySender, reply_channel};

pub const OPENAI_PROVIDER_ID: &str = "openai";

/// OpenAI-compatible chat completions, streamed through rig.
pub struct OpenAiProvider {
    provider_id: String,
    client: openai::Client,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "openai-new",
                provider_id: config.provider_id.clone(),
            }
        );

        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        let client = builder.build().context(HttpClientSnafu {
            stage: "openai-client",
        })?;

        Ok(Self {
            provider_id: config.provider_id,
            client,
        })
    }
}

fn history_message(turn: &Turn) -> RigMessage {
    match turn.speaker {
        Speaker::User => RigMessage::user(turn.text.clone()),
        Speaker::Assistant => RigMessage::assistant(turn.text.clone()),
    }
}

/// Reply text and reasoning pass through; tool traffic and the final usage chunk do not.
fn reply_event<R>(item: StreamedAssistantContent<R>) -> Option<ReplyEvent>
where
    R: Clone + Unpin,
{
    match item {
        StreamedAssistantContent::Text(text) if !text.text.is_empty() => {
            Some(ReplyEvent::Text(text.text))
        }
        StreamedAssistantContent::Reasoning(reasoning) => {
            let text = reasoning.reasoning.concat();
            (!text.is_empty()).then_some(ReplyEvent::Reasoning(text))
        }
        StreamedAssistantContent::ReasoningDelta { reasoning, .. } if !reasoning.is_empty() => {
            Some(ReplyEvent::Reasoning(reasoning))
        }
        _ => None,
    }
}

async fn answer(
    client: openai::Client,
    request: ChatRequest,
    events: ReplySender,
    mut cancel: CancelSignal,
) {
    let model_id = request.model_id.clone();
    let mut builder = client
        .completion_model(request.model_id)
        .completion_request(RigMessage::user(request.prompt))
        .messages(request.history.iter().map(history_message).collect::<Vec<_>>());
    if !request.preamble.trim().is_empty() {
        builder = builder.preamble(request.preamble);
    }
    if let Some(max_tokens) = request.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }

    let opened = tokio::select! {
        biased;
        _ = &mut cancel => {
            tracing::debug!(model_id = %model_id, "reply cancelled before the stream opened");
            return;
        }
        opened = builder.stream() => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(source) => {
            let error = ProviderError::Completion {
                stage: "open-reply",
                source,
            };
            tracing::error!(model_id = %model_id, error = %error, "could not open reply stream");
            events.send(ReplyEvent::Failed(error.to_string()));
            return;
        }
    };

    let last = loop {
        tokio::select! {
            _ = &mut cancel => {
                tracing::debug!(model_id = %model_id, "reply cancelled");
                stream.cancel();
                return;
            }
            item = stream.next() => match item {
                Some(Ok(item)) => {
                    if let Some(event) = reply_event(item)
                        && !events.send(event)
                    {
                        return;
                    }
                }
                Some(Err(source)) => {
                    let error = ProviderError::Completion {
                        stage: "reply-chunk",
                        source,
                    };
                    tracing::warn!(model_id = %model_id, error = %error, "reply stream broke off");
                    break ReplyEvent::Failed(error.to_string());
                }
                None => break ReplyEvent::Finished,
            },
        }
    };

    events.send(last);
}

impl LlmProvider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.provider_id
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn ask(&self, request: ChatRequest) -> ProviderResult<PendingReply> {
        ensure!(!request.is_blank(), BlankPromptSnafu { stage: "ask" });

        tracing::debug!(
            provider_id = %self.provider_id,
            model_id = %request.model_id,
            history_len = request.history.len(),
            max_tokens = ?request.max_tokens,
            "asking provider"
        );

        let (events, stream, cancel) = reply_channel();
        let worker: ReplyWorker = Box::pin(answer(self.client.clone(), request, events, cancel));

        Ok(PendingReply { stream, worker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Option<OpenAiProvider> {
        OpenAiProvider::new(ProviderConfig::new("openai", "sk-test", "http://127.0.0.1:9/v1")).ok()
    }

    #[test]
    fn blank_prompt_is_refused_before_a_worker_exists() {
        let result = provider().map(|provider| provider.ask(ChatRequest::new("gpt-4o", "  ")));

        assert!(matches!(result, Some(Err(ProviderError::BlankPrompt { .. }))));
    }

    #[test]
    fn missing_key_is_refused() {
        let result = OpenAiProvider::new(ProviderConfig::new("openai", "", ""));

        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn history_turns_keep_their_speaker() {
        let user = history_message(&Turn::user("how much sugar?"));
        let assistant = history_message(&Turn::assistant("12 g per serving"));

        assert!(matches!(user, RigMessage::User { .. }));
        assert!(matches!(assistant, RigMessage::Assistant { .. }));
    }

    #[tokio::test]
    async fn cancelling_before_the_stream_opens_sends_nothing() {
        let Some(provider) = provider() else {
            panic!("provider should build with a key");
        };
        let reply = provider.ask(ChatRequest::new("gpt-4o", "calories?"));
        let Ok(PendingReply { mut stream, worker }) = reply else {
            panic!("ask should start");
        };

        assert!(stream.cancel());
        worker.await;

        assert_eq!(stream.next().await, None);
    }
}
