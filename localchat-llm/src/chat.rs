// HTTP transport for OpenAI-compatible chat endpoints
use futures::StreamExt;
use openai_dive::v1::resources::{
    chat::{ChatCompletionParameters, ChatCompletionResponse, ChatCompletionChunkResponse},
    model::ListModelResponse,
};
use reqwest::{Method, RequestBuilder};
use reqwest_eventsource::{Error as EventSourceError, Event, RequestBuilderExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::config::EndpointConfig;
use crate::error::LlmError;
use crate::provider::LlmStream;

/// Marker sent by the server as the last SSE data payload
const DONE_MARKER: &str = "[DONE]";

#[derive(Clone, Debug)]
pub struct ChatClient {
    pub http_client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub headers: Option<HashMap<String, String>>,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            headers: None,
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(config.api_key.clone(), config.trimmed_base_url().to_string())
    }

    /// Add an extra header sent with every request
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Build a request with authentication headers
    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http_client
            .request(method, &url)
            .bearer_auth(&self.api_key);

        if let Some(headers) = &self.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        request
    }

    /// Check status code and map failures
    async fn check_status_code(
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, LlmError> {
        let response = result.map_err(|e| LlmError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(LlmError::Status { status, body })
        }
    }

    async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LlmError> {
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }

    pub async fn list_models(&self) -> Result<ListModelResponse, LlmError> {
        let result = self.build_request(Method::GET, "/models").send().await;
        let response = Self::check_status_code(result).await?;
        Self::decode_body(response).await
    }

    pub async fn chat_completion(
        &self,
        parameters: &ChatCompletionParameters,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let result = self
            .build_request(Method::POST, "/chat/completions")
            .json(parameters)
            .send()
            .await;

        let response = Self::check_status_code(result).await?;
        Self::decode_body(response).await
    }

    /// Open an SSE chat completion stream.
    ///
    /// Returns only once the server has accepted the stream, so connection
    /// and status failures surface here rather than as a stream item. Each
    /// `data:` payload becomes one item: payloads that fail to decode yield
    /// `LlmError::MalformedChunk` and the stream keeps going, while transport
    /// failures yield a final `LlmError::Stream` and end it.
    pub async fn chat_completion_stream(
        &self,
        parameters: &ChatCompletionParameters,
    ) -> Result<LlmStream, LlmError> {
        let mut event_source = self
            .build_request(Method::POST, "/chat/completions")
            .json(parameters)
            .eventsource()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        match event_source.next().await {
            Some(Ok(Event::Open)) => {
                tracing::debug!(target: "llm::stream", "event stream opened");
            }
            Some(Ok(Event::Message(message))) => {
                event_source.close();
                return Err(LlmError::Stream(format!(
                    "received data before the stream opened: {}",
                    message.data
                )));
            }
            Some(Err(error)) => {
                event_source.close();
                return Err(map_event_source_error(error).await);
            }
            None => {
                return Err(LlmError::Stream("stream closed before opening".to_string()));
            }
        }

        let stream = async_stream::stream! {
            let mut event_source = event_source;
            while let Some(event) = event_source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data.trim() == DONE_MARKER {
                            break;
                        }

                        match serde_json::from_str::<ChatCompletionChunkResponse>(&message.data) {
                            Ok(chunk) => yield Ok(chunk),
                            Err(e) => yield Err(LlmError::MalformedChunk(e.to_string())),
                        }
                    }
                    Err(EventSourceError::StreamEnded) => break,
                    Err(error) => {
                        tracing::warn!(target: "llm::stream", error = %error, "event stream failed");
                        yield Err(LlmError::Stream(map_event_source_error(error).await.to_string()));
                        break;
                    }
                }
            }
            // never let the event source reconnect and replay the POST
            event_source.close();
        };

        Ok(Box::new(Box::pin(stream)))
    }
}

async fn map_event_source_error(error: EventSourceError) -> LlmError {
    match error {
        EventSourceError::InvalidStatusCode(status, response) => LlmError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        },
        EventSourceError::InvalidContentType(content_type, _) => LlmError::MalformedResponse(
            format!("expected an event stream, got content type {:?}", content_type),
        ),
        EventSourceError::Transport(error) => LlmError::Transport(error.to_string()),
        EventSourceError::StreamEnded => {
            LlmError::Stream("stream ended before any event".to_string())
        }
        other => LlmError::Stream(other.to_string()),
    }
}
