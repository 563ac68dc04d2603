use localchat_llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging error: {0}")]
    Logging(String),
}
