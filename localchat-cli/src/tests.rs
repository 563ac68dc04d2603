use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use localchat_llm::{
    ChatCompletionChunkResponse, ChatCompletionParameters, ChatCompletionResponse, LlmClient, LlmError,
    LlmProvider, LlmStream, ListModelResponse,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::error::CliError;
use crate::render::{write_reply, write_stream, StreamSummary};
use crate::requests::{self, MODEL};
use crate::runner::{run_basic, run_stream};

fn completion(choices: Value) -> ChatCompletionResponse {
    serde_json::from_value(completion_json(choices)).unwrap()
}

fn completion_json(choices: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": MODEL,
        "choices": choices,
    })
}

fn hello_choices() -> Value {
    json!([{
        "index": 0,
        "message": {"role": "assistant", "content": "Hello!"},
        "finish_reason": null
    }])
}

fn chunk_json(delta: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u32,
        "model": MODEL,
        "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
    })
}

fn chunk(delta: Value) -> ChatCompletionChunkResponse {
    serde_json::from_value(chunk_json(delta)).unwrap()
}

fn text_chunk(text: &str) -> Result<ChatCompletionChunkResponse, LlmError> {
    Ok(chunk(json!({"content": text})))
}

fn roses() -> Vec<Result<ChatCompletionChunkResponse, LlmError>> {
    vec![
        text_chunk("Ro"),
        text_chunk("ses"),
        Ok(chunk(json!({}))),
        text_chunk(" are red"),
    ]
}

/// Provider that records requests and replays canned replies
struct ScriptedProvider {
    reply: Mutex<Option<Result<ChatCompletionResponse, LlmError>>>,
    fragments: Mutex<Option<Vec<Result<ChatCompletionChunkResponse, LlmError>>>>,
    requests: Arc<Mutex<Vec<ChatCompletionParameters>>>,
}

impl ScriptedProvider {
    fn replying(reply: Result<ChatCompletionResponse, LlmError>) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            fragments: Mutex::new(None),
            requests: Arc::default(),
        }
    }

    fn streaming(fragments: Vec<Result<ChatCompletionChunkResponse, LlmError>>) -> Self {
        Self {
            reply: Mutex::new(None),
            fragments: Mutex::new(Some(fragments)),
            requests: Arc::default(),
        }
    }

    fn recorder(&self) -> Arc<Mutex<Vec<ChatCompletionParameters>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn models(&self) -> Result<ListModelResponse, LlmError> {
        Err(LlmError::Config("not scripted".to_string()))
    }

    async fn chat(&self, request: ChatCompletionParameters) -> Result<ChatCompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(LlmError::Config("no reply scripted".to_string())))
    }

    async fn chat_stream(&self, request: ChatCompletionParameters) -> Result<LlmStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        let fragments = self
            .fragments
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| LlmError::Config("no stream scripted".to_string()))?;
        Ok(Box::new(stream::iter(fragments)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[test]
fn reply_is_printed_with_trailing_newline() {
    let mut out = Vec::new();
    write_reply(&completion(hello_choices()), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");
}

#[test]
fn empty_choices_print_nothing() {
    let mut out = Vec::new();
    let error = write_reply(&completion(json!([])), &mut out).unwrap_err();
    assert!(matches!(error, CliError::Llm(LlmError::NoChoices)), "got {:?}", error);
    assert!(out.is_empty());
}

#[tokio::test]
async fn stream_concatenates_deltas_without_newline() {
    let mut out = Vec::new();
    let summary = write_stream(stream::iter(roses()), &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Roses are red");
    assert_eq!(summary, StreamSummary { written: 3, skipped: 0 });
}

#[tokio::test]
async fn malformed_fragment_is_skipped_and_counted() {
    let fragments = vec![
        text_chunk("Roses"),
        Err(LlmError::MalformedChunk("missing field `delta`".to_string())),
        text_chunk(" are red"),
    ];

    let mut out = Vec::new();
    let summary = write_stream(stream::iter(fragments), &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Roses are red");
    assert_eq!(summary, StreamSummary { written: 2, skipped: 1 });
}

#[tokio::test]
async fn fragment_without_choices_is_skipped() {
    let no_choices: ChatCompletionChunkResponse = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u32,
        "model": MODEL,
        "choices": []
    }))
    .unwrap();
    let fragments = vec![text_chunk("Violets"), Ok(no_choices), text_chunk(" are blue")];

    let mut out = Vec::new();
    let summary = write_stream(stream::iter(fragments), &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Violets are blue");
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn broken_connection_ends_rendering_with_error() {
    let fragments = vec![
        text_chunk("Roses"),
        Err(LlmError::Stream("connection reset".to_string())),
        text_chunk(" never printed"),
    ];

    let mut out = Vec::new();
    let error = write_stream(stream::iter(fragments), &mut out).await.unwrap_err();

    assert!(matches!(error, CliError::Llm(LlmError::Stream(_))), "got {:?}", error);
    assert_eq!(String::from_utf8(out).unwrap(), "Roses");
}

#[tokio::test]
async fn basic_run_sends_fixed_request() {
    let provider = ScriptedProvider::replying(Ok(completion(hello_choices())));
    let sent = provider.recorder();
    let client = LlmClient::with_provider(Box::new(provider));

    let mut out = Vec::new();
    run_basic(&client, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");
    assert_eq!(client.provider_name(), "scripted");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].model, MODEL);
    assert_eq!(sent[0].max_tokens, Some(requests::BASIC_MAX_TOKENS));
    assert_eq!(sent[0].stream, None);
}

#[tokio::test]
async fn basic_run_propagates_failure() {
    let client = LlmClient::with_provider(Box::new(ScriptedProvider::replying(Err(LlmError::Transport(
        "connection refused".to_string(),
    )))));

    let mut out = Vec::new();
    let error = run_basic(&client, &mut out).await.unwrap_err();
    assert!(matches!(error, CliError::Llm(LlmError::Transport(_))), "got {:?}", error);
    assert!(out.is_empty());
}

#[tokio::test]
async fn stream_run_renders_scripted_fragments() {
    let provider = ScriptedProvider::streaming(roses());
    let sent = provider.recorder();
    let client = LlmClient::with_provider(Box::new(provider));

    let mut out = Vec::new();
    let summary = run_stream(&client, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Roses are red");
    assert_eq!(summary.written, 3);
    assert_eq!(sent.lock().unwrap()[0].stream, Some(true));
}

/// Body as it goes over the wire; `to_value` would widen the f32 temperature
fn wire_body(request: &ChatCompletionParameters) -> Value {
    serde_json::from_str(&serde_json::to_string(request).unwrap()).unwrap()
}

#[test]
fn fixed_requests_carry_literal_values() {
    let basic = wire_body(&requests::basic_request());
    assert_eq!(basic["model"], "TinyLlama/TinyLlama-1.1B-Chat-v1.0");
    assert_eq!(basic["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(basic["messages"][0]["role"], "user");
    assert_eq!(basic["messages"][0]["content"], "Say hello in one sentence.");
    assert_eq!(basic["temperature"], 0.7);
    assert_eq!(basic["max_tokens"], 64);
    assert!(basic.get("stream").map_or(true, Value::is_null));

    let streaming = wire_body(&requests::stream_request());
    assert_eq!(streaming["model"], "TinyLlama/TinyLlama-1.1B-Chat-v1.0");
    assert_eq!(streaming["messages"].as_array().map(Vec::len), Some(1));
    assert_eq!(streaming["messages"][0]["role"], "user");
    assert_eq!(streaming["messages"][0]["content"], "Stream a short poem.");
    assert_eq!(streaming["temperature"], 0.7);
    assert_eq!(streaming["max_tokens"], 128);
    assert_eq!(streaming["stream"], true);

    // identical bodies on every run
    assert_eq!(serde_json::to_string(&requests::basic_request()).unwrap(), serde_json::to_string(&requests::basic_request()).unwrap());
    assert_eq!(wire_body(&requests::basic_request()), basic);
    assert_eq!(wire_body(&requests::stream_request()), streaming);
}

#[tokio::test]
async fn basic_run_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_json(hello_choices())))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::compatible("not-needed".to_string(), format!("{}/v1", server.uri()));
    let mut out = Vec::new();
    run_basic(&client, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello!\n");

    let requests = server.received_requests().await.expect("request not recorded");
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["messages"][0]["content"], "Say hello in one sentence.");
    assert_eq!(body["max_tokens"], 64);
}

#[tokio::test]
async fn basic_run_against_server_with_no_choices_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_json(json!([]))))
        .mount(&server)
        .await;

    let client = LlmClient::compatible("not-needed".to_string(), format!("{}/v1", server.uri()));
    let mut out = Vec::new();
    assert!(run_basic(&client, &mut out).await.is_err());
    assert!(out.is_empty());
}

#[tokio::test]
async fn stream_run_against_server_skips_malformed_fragment() {
    let events = [
        chunk_json(json!({"role": "assistant", "content": "Ro"})).to_string(),
        chunk_json(json!({"content": "ses"})).to_string(),
        chunk_json(json!({})).to_string(),
        json!({"id": "chatcmpl-1", "choices": [{"index": 0}]}).to_string(),
        chunk_json(json!({"content": " are red"})).to_string(),
    ];
    let mut body: String = events.iter().map(|data| format!("data: {}\n\n", data)).collect();
    body.push_str("data: [DONE]\n\n");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::compatible("not-needed".to_string(), format!("{}/v1", server.uri()));
    let mut out = Vec::new();
    let summary = run_stream(&client, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Roses are red");
    assert_eq!(summary.written, 3);
    assert_eq!(summary.skipped, 1);

    let requests = server.received_requests().await.expect("request not recorded");
    let sent: Value = requests[0].body_json().unwrap();
    assert_eq!(sent["messages"][0]["content"], "Stream a short poem.");
    assert_eq!(sent["max_tokens"], 128);
    assert_eq!(sent["stream"], true);
}

#[tokio::test]
async fn stream_run_fails_when_server_is_down() {
    let client = LlmClient::compatible("not-needed".to_string(), "http://127.0.0.1:1/v1".to_string());
    let mut out = Vec::new();
    let error = run_stream(&client, &mut out).await.unwrap_err();
    assert!(matches!(error, CliError::Llm(LlmError::Transport(_))), "got {:?}", error);
    assert!(out.is_empty());
}
