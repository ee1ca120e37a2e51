use std::sync::Arc;

mod model;
mod openai;
mod provider;
mod request;
mod stream;

pub use model::{DEFAULT_OPENAI_MODEL, Model, default_openai_models};
pub use openai::{OPENAI_PROVIDER_ID, OpenAiProvider};
pub use provider::{
    LlmProvider, PendingReply, ProviderConfig, ProviderError, ProviderResult, ReplyWorker,
};
pub use request::{ChatRequest, Speaker, Turn};
pub use stream::{CancelSignal, ReplyEvent, ReplySender, ReplyStream, reply_channel};

/// Builds the provider named by `config.provider_id`. Blank means OpenAI.
pub fn create_provider(mut config: ProviderConfig) -> ProviderResult<Arc<dyn LlmProvider>> {
    match config.provider_id.as_str() {
        "" | "openai" | "rig-openai" => {
            config.provider_id = OPENAI_PROVIDER_ID.to_string();
            Ok(Arc::new(OpenAiProvider::new(config)?))
        }
        _ => Err(ProviderError::UnsupportedProvider {
            stage: "create-provider",
            provider_id: config.provider_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_id_is_rejected() {
        let config = ProviderConfig::new("acme", "sk-test", "https://example.invalid/v1");
        let error = create_provider(config).err().map(|error| error.to_string());

        assert_eq!(
            error.as_deref(),
            Some("unknown provider `acme` (on `create-provider`)")
        );
    }

    #[test]
    fn blank_api_key_is_rejected_before_any_request() {
        let config = ProviderConfig::new("openai", "   ", "https://api.openai.com/v1");

        assert!(matches!(
            create_provider(config),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn blank_provider_id_resolves_to_openai() {
        let config = ProviderConfig::new("  ", "sk-test", "https://api.openai.com/v1");
        let provider = create_provider(config).ok();

        assert_eq!(
            provider.as_ref().map(|provider| provider.id()),
            Some(OPENAI_PROVIDER_ID)
        );
    }
}
