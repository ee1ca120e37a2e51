use std::future::Future;
use std::pin::Pin;

use snafu::Snafu;

use crate::request::ChatRequest;
use crate::stream::ReplyStream;

/// Where and how to reach a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    /// Base URL; blank means the provider default.
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let trimmed = |value: String| value.trim().to_string();
        Self {
            provider_id: trimmed(provider_id.into()),
            api_key: trimmed(api_key.into()),
            endpoint: trimmed(endpoint.into()),
        }
    }
}

/// Future that talks to the provider and feeds the matching [`ReplyStream`].
pub type ReplyWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A started request: read `stream` on the UI side, run `worker` on tokio.
pub struct PendingReply {
    pub stream: ReplyStream,
    pub worker: ReplyWorker,
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("provider `{provider_id}` needs an API key (on `{stage}`)"))]
    MissingApiKey {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("unknown provider `{provider_id}` (on `{stage}`)"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("refusing to send a blank prompt (on `{stage}`)"))]
    BlankPrompt { stage: &'static str },
    #[snafu(display("could not build the HTTP client on `{stage}`: {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("completion request failed on `{stage}`: {source}"))]
    Completion {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
}

/// A chat backend the assistant can ask.
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    /// Starts answering `request`. Nothing is sent until the worker runs.
    fn ask(&self, request: ChatRequest) -> ProviderResult<PendingReply>;
}
