use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use chat_playground::config::AppConfig;
use chat_playground::error::PlaygroundError;
use chat_playground::protocol::{ChatCompletionRequest, ModelDescriptor};
use chat_playground::routing::dispatch::dispatch_request;
use chat_playground::state::AppState;
use chat_playground::upstream::{ByteStream, MockFireworks, MockTiming, ModelApi};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};

enum Reply {
    Frames(Vec<&'static str>),
    Fail(fn() -> PlaygroundError),
}

struct RecordingApi {
    reply: Reply,
    calls: Mutex<Vec<ChatCompletionRequest>>,
}

impl RecordingApi {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl ModelApi for RecordingApi {
    fn list_models(&self) -> BoxFuture<'_, Result<Vec<ModelDescriptor>, PlaygroundError>> {
        async { Ok(Vec::new()) }.boxed()
    }

    fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> BoxFuture<'_, Result<ByteStream, PlaygroundError>> {
        self.calls.lock().push(request);
        let result = match &self.reply {
            Reply::Frames(frames) => {
                let items: Vec<Result<Bytes, PlaygroundError>> = frames
                    .iter()
                    .map(|frame| Ok(Bytes::from_static(frame.as_bytes())))
                    .collect();
                Ok(futures_util::stream::iter(items).boxed())
            }
            Reply::Fail(make_error) => Err(make_error()),
        };
        async move { result }.boxed()
    }
}

fn state_with(api: Arc<RecordingApi>) -> Arc<AppState> {
    Arc::new(AppState::new(AppConfig::default(), api))
}

async fn post_chat(state: Arc<AppState>, body: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    let response = dispatch_request(state, Arc::<str>::from(""), request)
        .await
        .expect("dispatch");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    (status, headers, body)
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn test_missing_model_is_rejected_without_upstream_call() {
    let api = RecordingApi::new(Reply::Frames(vec!["data: [DONE]\n\n"]));
    let (status, _, body) = post_chat(
        state_with(Arc::clone(&api)),
        r#"{"messages":[{"role":"user","content":"Hello"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&body),
        json!({ "error": "Missing required fields: model and messages" })
    );
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_missing_or_non_array_messages_is_rejected() {
    for body in [r#"{"model":"m"}"#, r#"{"model":"m","messages":"hi"}"#] {
        let api = RecordingApi::new(Reply::Frames(Vec::new()));
        let (status, _, response) = post_chat(state_with(Arc::clone(&api)), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            json_body(&response)["error"],
            "Missing required fields: model and messages"
        );
        assert_eq!(api.call_count(), 0);
    }
}

#[tokio::test]
async fn test_upstream_failure_maps_to_500_with_message() {
    let api = RecordingApi::new(Reply::Fail(|| PlaygroundError::Upstream {
        status: 401,
        message: "x".to_string(),
    }));
    let (status, _, body) = post_chat(
        state_with(api),
        r#"{"model":"m","messages":[{"role":"user","content":"Hello"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({ "error": "x" }));
}

#[tokio::test]
async fn test_empty_error_message_uses_fallback() {
    let api = RecordingApi::new(Reply::Fail(|| PlaygroundError::Transport(String::new())));
    let (status, _, body) =
        post_chat(state_with(api), r#"{"model":"m","messages":[]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["error"], "An unknown error occurred");
}

#[tokio::test]
async fn test_missing_api_key_surfaces_as_500() {
    let api = RecordingApi::new(Reply::Fail(|| {
        PlaygroundError::Config("FIREWORKS_API_KEY is not configured".to_string())
    }));
    let (status, _, body) =
        post_chat(state_with(api), r#"{"model":"m","messages":[]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&body)["error"],
        "FIREWORKS_API_KEY is not configured"
    );
}

#[tokio::test]
async fn test_malformed_json_is_500() {
    let api = RecordingApi::new(Reply::Frames(Vec::new()));
    let (status, _, body) = post_chat(state_with(Arc::clone(&api)), "{not json").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(&body)["error"].as_str().is_some());
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_success_streams_upstream_bytes_verbatim() {
    let frames = vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        "data: [DONE]\n\n",
    ];
    let api = RecordingApi::new(Reply::Frames(frames.clone()));
    let (status, headers, body) = post_chat(
        state_with(Arc::clone(&api)),
        r#"{"model":"accounts/fireworks/models/qwen3-30b-a3b","messages":[{"role":"user","content":"Hello"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/event-stream");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["connection"], "keep-alive");
    assert_eq!(body, Bytes::from(frames.concat()));

    let calls = api.calls.lock();
    assert_eq!(calls.len(), 1);
    let request = &calls[0];
    assert_eq!(request.model, "accounts/fireworks/models/qwen3-30b-a3b");
    assert!(request.stream);
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.max_tokens, Some(2048));
    assert_eq!(
        request.messages,
        vec![json!({ "role": "user", "content": "Hello" })]
    );
}

const UNUSUAL_MESSAGES: [&str; 4] = [
    r#"[{"role":"tool","content":"x"}]"#,
    r#"[{"content":"hello"}]"#,
    r#"[{"role":"user","content":[{"type":"text","text":"hi"}]}]"#,
    "[1,2]",
];

#[tokio::test]
async fn test_message_entries_are_forwarded_verbatim() {
    for messages in UNUSUAL_MESSAGES {
        let api = RecordingApi::new(Reply::Frames(vec!["data: [DONE]\n\n"]));
        let body = format!(r#"{{"model":"m","messages":{messages}}}"#);
        let (status, _, _) = post_chat(state_with(Arc::clone(&api)), &body).await;
        assert_eq!(status, StatusCode::OK, "{messages}");

        let expected: Vec<Value> = serde_json::from_str(messages).expect("messages json");
        let calls = api.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].messages, expected);
    }
}

#[tokio::test]
async fn test_mock_mode_streams_for_any_message_shape() {
    for messages in UNUSUAL_MESSAGES {
        let state = Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(MockFireworks::new(MockTiming::INSTANT)),
        ));
        let body = format!(r#"{{"model":"m","messages":{messages}}}"#);
        let (status, headers, body) = post_chat(state, &body).await;
        assert_eq!(status, StatusCode::OK, "{messages}");
        assert_eq!(headers["content-type"], "text/event-stream");
        assert!(body.ends_with(b"data: [DONE]\n\n"), "{messages}");
    }
}

#[tokio::test]
async fn test_wrong_method_and_unknown_path() {
    let api = RecordingApi::new(Reply::Frames(Vec::new()));
    let state = state_with(api);

    let request = Request::builder()
        .method("GET")
        .uri("/api/chat")
        .body(Body::empty())
        .expect("build request");
    let response = dispatch_request(Arc::clone(&state), Arc::<str>::from(""), request)
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method("POST")
        .uri("/api/unknown")
        .body(Body::empty())
        .expect("build request");
    let response = dispatch_request(state, Arc::<str>::from(""), request)
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let api = RecordingApi::new(Reply::Frames(Vec::new()));
    let body = format!(
        r#"{{"model":"m","messages":[{{"role":"user","content":"{}"}}]}}"#,
        "a".repeat(3 * 1024 * 1024)
    );
    let (status, _, _) = post_chat(state_with(Arc::clone(&api)), &body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(api.call_count(), 0);
}
