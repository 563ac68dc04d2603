pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod provider;
pub mod chat;
pub mod reply;

// Re-export our client
pub use client::LlmClient;
pub use config::EndpointConfig;
pub use error::LlmError;
pub use provider::{LlmProvider, LlmStream};
pub use reply::{DeltaText, FirstChoiceText};

// Re-export commonly used openai_dive types for consumers
pub use openai_dive::v1::resources::chat::{
    ChatCompletionParameters,
    ChatCompletionResponse,
    ChatCompletionChunkResponse,
    ChatMessage,
    ChatMessageContent,
    DeltaChatMessage,
};
pub use openai_dive::v1::resources::model::ListModelResponse;
