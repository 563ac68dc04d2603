// Fixed requests sent by the two demo binaries
use localchat_llm::{ChatCompletionParameters, ChatMessage, ChatMessageContent};

pub const MODEL: &str = "TinyLlama/TinyLlama-1.1B-Chat-v1.0";
pub const TEMPERATURE: f32 = 0.7;

pub const BASIC_PROMPT: &str = "Say hello in one sentence.";
pub const BASIC_MAX_TOKENS: u32 = 64;

pub const STREAM_PROMPT: &str = "Stream a short poem.";
pub const STREAM_MAX_TOKENS: u32 = 128;

fn user_message(prompt: &str) -> ChatMessage {
    ChatMessage::User {
        content: ChatMessageContent::Text(prompt.to_string()),
        name: None,
    }
}

/// One-shot request; `stream` is left unset so the server replies with a single body
pub fn basic_request() -> ChatCompletionParameters {
    ChatCompletionParameters {
        model: MODEL.to_string(),
        messages: vec![user_message(BASIC_PROMPT)],
        temperature: Some(TEMPERATURE),
        max_tokens: Some(BASIC_MAX_TOKENS),
        ..Default::default()
    }
}

pub fn stream_request() -> ChatCompletionParameters {
    ChatCompletionParameters {
        model: MODEL.to_string(),
        messages: vec![user_message(STREAM_PROMPT)],
        temperature: Some(TEMPERATURE),
        max_tokens: Some(STREAM_MAX_TOKENS),
        stream: Some(true),
        ..Default::default()
    }
}
