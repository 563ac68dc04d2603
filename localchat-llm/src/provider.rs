use std::fmt::Debug;
use async_trait::async_trait;
use futures::Stream;
use openai_dive::v1::resources::{
    chat::{ChatCompletionParameters, ChatCompletionResponse, ChatCompletionChunkResponse},
    model::ListModelResponse,
};

use crate::error::LlmError;

pub type LlmStream = Box<dyn Stream<Item = Result<ChatCompletionChunkResponse, LlmError>> + Send + Unpin>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn models(&self) -> Result<ListModelResponse, LlmError>;

    async fn default_model(&self) -> Result<String, LlmError> {
        let models = self.models().await?;
        models.data
            .first()
            .map(|m| m.id.clone())
            .ok_or_else(|| LlmError::MalformedResponse("no model available".to_string()))
    }

    async fn chat(&self, request: ChatCompletionParameters) -> Result<ChatCompletionResponse, LlmError>;

    async fn chat_stream(&self, request: ChatCompletionParameters) -> Result<LlmStream, LlmError>;

    fn name(&self) -> &'static str;
}

impl<'a> Debug for dyn LlmProvider + 'a {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LlmProvider({})", self.name())
    }
}
