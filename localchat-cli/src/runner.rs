use std::io::Write;

use localchat_llm::LlmClient;

use crate::error::CliError;
use crate::render::{self, StreamSummary};
use crate::requests;

/// Send the fixed one-shot request and print the reply
pub async fn run_basic<W: Write>(client: &LlmClient, out: &mut W) -> Result<(), CliError> {
    let response = client.chat(requests::basic_request()).await?;
    render::write_reply(&response, out)
}

/// Send the fixed streaming request and print fragments as they arrive
pub async fn run_stream<W: Write>(client: &LlmClient, out: &mut W) -> Result<StreamSummary, CliError> {
    let stream = client.chat_stream(requests::stream_request()).await?;
    render::write_stream(stream, out).await
}
