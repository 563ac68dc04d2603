use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Transport(String),
    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Malformed stream chunk: {0}")]
    MalformedChunk(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Response contained no choices")]
    NoChoices,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// True when the failure is scoped to a single stream fragment and the
    /// rest of the stream is still usable.
    pub fn is_fragment_error(&self) -> bool {
        matches!(self, LlmError::MalformedChunk(_))
    }
}
