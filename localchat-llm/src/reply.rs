use openai_dive::v1::resources::chat::{
    ChatCompletionChunkResponse, ChatCompletionResponse, ChatMessage, ChatMessageContent, DeltaChatMessage,
};

use crate::error::LlmError;

pub trait FirstChoiceText {
    /// Text of the first choice's message.
    /// Fails when there is no choice or the message carries no text.
    fn first_choice_text(&self) -> Result<&str, LlmError>;
}

impl FirstChoiceText for ChatCompletionResponse {
    fn first_choice_text(&self) -> Result<&str, LlmError> {
        let choice = self.choices.first().ok_or(LlmError::NoChoices)?;
        match &choice.message {
            ChatMessage::Assistant { content: Some(ChatMessageContent::Text(text)), .. } => Ok(text.as_str()),
            ChatMessage::Assistant { .. } => Err(LlmError::MalformedResponse(
                "first choice has no text content".to_string(),
            )),
            other => Err(LlmError::MalformedResponse(format!(
                "first choice is not an assistant message: {:?}",
                other
            ))),
        }
    }
}

pub trait DeltaText {
    /// Text delta of the first choice, `None` when the fragment carries no text.
    fn delta_text(&self) -> Result<Option<&str>, LlmError>;
}

impl DeltaText for ChatCompletionChunkResponse {
    fn delta_text(&self) -> Result<Option<&str>, LlmError> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| LlmError::MalformedChunk("fragment has no choices".to_string()))?;

        match &choice.delta {
            DeltaChatMessage::Assistant { content: Some(ChatMessageContent::Text(text)), .. } |
            DeltaChatMessage::Untagged { content: Some(ChatMessageContent::Text(text)), .. } => {
                Ok(Some(text.as_str()))
            }
            _ => Ok(None),
        }
    }
}
