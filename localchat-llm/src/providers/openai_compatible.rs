use crate::chat::ChatClient;
use crate::config::EndpointConfig;
use crate::error::LlmError;
use crate::provider::{LlmProvider, LlmStream};
use async_trait::async_trait;
use openai_dive::v1::resources::{
    chat::{ChatCompletionParameters, ChatCompletionResponse},
    model::ListModelResponse,
};

pub struct OpenAICompatibleProvider {
    client: ChatClient,
}

impl OpenAICompatibleProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: ChatClient::new(api_key, base_url),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self {
            client: ChatClient::from_config(config),
        })
    }

    /// Provider for the inference server on localhost
    pub fn local() -> Self {
        let config = EndpointConfig::default();
        Self {
            client: ChatClient::from_config(&config),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    async fn models(&self) -> Result<ListModelResponse, LlmError> {
        self.client.list_models().await
    }

    async fn chat(&self, request: ChatCompletionParameters) -> Result<ChatCompletionResponse, LlmError> {
        self.client.chat_completion(&request).await
    }

    async fn chat_stream(&self, mut request: ChatCompletionParameters) -> Result<LlmStream, LlmError> {
        // Ensure streaming is enabled
        request.stream = Some(true);

        self.client.chat_completion_stream(&request).await
    }

    fn name(&self) -> &'static str {
        "openai_compatible"
    }
}
