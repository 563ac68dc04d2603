use super::config::EndpointConfig;
use super::error::LlmError;
use super::provider::{LlmProvider, LlmStream};
use super::providers::openai_compatible::OpenAICompatibleProvider;
use openai_dive::v1::resources::{
    chat::{ChatCompletionParameters, ChatCompletionResponse},
    model::ListModelResponse,
};

#[derive(Debug)]
pub struct LlmClient {
    provider: Box<dyn LlmProvider>,
}

/// Provider Factory related method
impl LlmClient {
    /// Client for the OpenAI-compatible server on localhost:8001
    pub fn local() -> Self {
        Self {
            provider: Box::new(OpenAICompatibleProvider::local()),
        }
    }

    pub fn compatible(api_key: String, base_url: String) -> Self {
        Self {
            provider: Box::new(OpenAICompatibleProvider::new(api_key, base_url)),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self, LlmError> {
        let provider = OpenAICompatibleProvider::from_config(config)?;
        Ok(Self {
            provider: Box::new(provider),
        })
    }

    pub fn with_provider(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

/// Provider Delegate
impl LlmClient {
    pub async fn models(&self) -> Result<ListModelResponse, LlmError> {
        self.provider.models().await
    }

    pub async fn default_model(&self) -> Result<String, LlmError> {
        self.provider.default_model().await
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Get a reference to the underlying provider (for testing)
    pub fn provider(&self) -> &dyn LlmProvider {
        &*self.provider
    }
}

/// Higher level chat client
impl LlmClient {
    pub async fn chat(&self, request: ChatCompletionParameters) -> Result<ChatCompletionResponse, LlmError> {
        tracing::debug!(
            target: "llm::request",
            provider = self.provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let response = self.provider.chat(request).await?;
        tracing::debug!(target: "llm::request", choices = response.choices.len(), "chat completion received");
        Ok(response)
    }

    pub async fn chat_stream(&self, request: ChatCompletionParameters) -> Result<LlmStream, LlmError> {
        tracing::debug!(
            target: "llm::request",
            provider = self.provider.name(),
            model = %request.model,
            messages = request.messages.len(),
            "opening chat completion stream"
        );

        self.provider.chat_stream(request).await
    }
}
