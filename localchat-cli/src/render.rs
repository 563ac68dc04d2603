use std::io::Write;

use futures::{Stream, StreamExt};
use localchat_llm::{ChatCompletionChunkResponse, ChatCompletionResponse, DeltaText, FirstChoiceText, LlmError};

use crate::error::CliError;

/// Counters for one rendered stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Fragments whose text was written out
    pub written: usize,
    /// Fragments dropped because they could not be read
    pub skipped: usize,
}

impl StreamSummary {
    fn skip(&mut self, error: &LlmError) {
        self.skipped += 1;
        tracing::warn!(target: "render::skip", skipped = self.skipped, error = %error, "skipping stream fragment");
    }
}

/// Write the first choice's text followed by a newline.
/// Nothing is written if the response has no usable first choice.
pub fn write_reply<W: Write>(response: &ChatCompletionResponse, out: &mut W) -> Result<(), CliError> {
    let text = response.first_choice_text()?;
    writeln!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

/// Write each fragment's text as soon as it arrives, flushing after every
/// write and never adding a newline.
///
/// A fragment that cannot be parsed or read is logged, counted and dropped;
/// the stream carries on with the next one. Any other stream error ends
/// rendering with that error.
pub async fn write_stream<S, W>(mut stream: S, out: &mut W) -> Result<StreamSummary, CliError>
where
    S: Stream<Item = Result<ChatCompletionChunkResponse, LlmError>> + Unpin,
    W: Write,
{
    let mut summary = StreamSummary::default();

    while let Some(item) = stream.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(error) if error.is_fragment_error() => {
                summary.skip(&error);
                continue;
            }
            Err(error) => return Err(error.into()),
        };

        match chunk.delta_text() {
            Ok(Some(text)) if !text.is_empty() => {
                out.write_all(text.as_bytes())?;
                out.flush()?;
                summary.written += 1;
            }
            Ok(_) => {}
            Err(error) => summary.skip(&error),
        }
    }

    tracing::debug!(target: "llm::stream", written = summary.written, skipped = summary.skipped, "stream complete");
    Ok(summary)
}
