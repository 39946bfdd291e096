use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use serde_json::{json, Value};

use super::{ByteStream, ModelApi};
use crate::clock::{unix_now_millis, unix_now_secs};
use crate::config::UpstreamConfig;
use crate::error::PlaygroundError;
use crate::protocol::{ChatCompletionRequest, ModelDescriptor};
use crate::stream::sse::{data_frame, done_frame};

const GREETING_REPLY: &str = "Hello! I'm a mock AI assistant. How can I help you today?";
const WEATHER_REPLY: &str =
    "The weather is sunny and 72°F with a light breeze. Perfect day for a walk!";
const JOKE_REPLY: &str =
    "Why don't scientists trust atoms? Because they make up everything! 😄";
const HELP_REPLY: &str = "I'm here to help! I can answer questions, tell jokes, discuss the weather, or just chat. What would you like to know?";
const FALLBACK_REPLY: &str = "This is a mock response from the Fireworks AI SDK. In a real implementation, this would be the actual AI model's response to your message.";

/// Artificial latency of the mock upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTiming {
    /// Before the models list and before the first streamed word.
    pub initial_delay: Duration,
    /// Between streamed words.
    pub word_delay: Duration,
}

impl MockTiming {
    pub const INSTANT: Self = Self {
        initial_delay: Duration::ZERO,
        word_delay: Duration::ZERO,
    };

    #[must_use]
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.mock_initial_delay_ms),
            word_delay: Duration::from_millis(config.mock_word_delay_ms),
        }
    }
}

/// In-process stand-in for the hosted API that streams canned replies.
#[derive(Debug, Clone)]
pub struct MockFireworks {
    timing: MockTiming,
}

impl MockFireworks {
    #[must_use]
    pub fn new(timing: MockTiming) -> Self {
        Self { timing }
    }
}

impl ModelApi for MockFireworks {
    fn list_models(&self) -> BoxFuture<'_, Result<Vec<ModelDescriptor>, PlaygroundError>> {
        async move {
            pause(self.timing.initial_delay).await;
            Ok(mock_models())
        }
        .boxed()
    }

    fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> BoxFuture<'_, Result<ByteStream, PlaygroundError>> {
        async move {
            pause(self.timing.initial_delay).await;
            let reply = mock_reply(&request.messages);
            tracing::debug!(model = %request.model, reply_len = reply.len(), "streaming mock reply");
            Ok(mock_stream(request.model, reply, self.timing))
        }
        .boxed()
    }

    fn is_mock(&self) -> bool {
        true
    }
}

/// The two canned models.
#[must_use]
pub fn mock_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            name: "accounts/fireworks/models/qwen3-30b-a3b".to_string(),
            title: "Qwen3 30B-A3B".to_string(),
            description: Some(
                "Latest Qwen3 state of the art model, 30B with 3B active parameter model"
                    .to_string(),
            ),
        },
        ModelDescriptor {
            name: "accounts/fireworks/models/llama-v3-8b-instruct".to_string(),
            title: "Llama v3 8B Instruct".to_string(),
            description: Some(
                "Meta's latest Llama model optimized for instruction following".to_string(),
            ),
        },
    ]
}

/// Canned reply for the last message, matched case-insensitively by substring.
///
/// Entries without string `content` match nothing and get the fallback reply.
#[must_use]
pub fn mock_reply(messages: &[Value]) -> &'static str {
    let content = messages
        .last()
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default();

    if content.contains("hello") || content.contains("hi") {
        GREETING_REPLY
    } else if content.contains("weather") {
        WEATHER_REPLY
    } else if content.contains("joke") {
        JOKE_REPLY
    } else if content.contains("help") {
        HELP_REPLY
    } else {
        FALLBACK_REPLY
    }
}

enum Step {
    Role,
    Word(usize),
    Finish,
    Done,
    End,
}

struct MockStreamState {
    model: String,
    words: Vec<&'static str>,
    timing: MockTiming,
    step: Step,
}

fn mock_stream(model: String, reply: &'static str, timing: MockTiming) -> ByteStream {
    let state = MockStreamState {
        model,
        words: reply.split(' ').collect(),
        timing,
        step: Step::Role,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        let frame = match state.step {
            Step::Role => {
                state.step = Step::Word(0);
                chunk_frame(&state.model, json!({ "role": "assistant" }), Value::Null)
            }
            Step::Word(index) => {
                pause(if index == 0 {
                    state.timing.initial_delay
                } else {
                    state.timing.word_delay
                })
                .await;
                let content = match state.words.get(index) {
                    Some(word) if index == 0 => (*word).to_string(),
                    Some(word) => format!(" {word}"),
                    None => String::new(),
                };
                state.step = if index + 1 < state.words.len() {
                    Step::Word(index + 1)
                } else {
                    Step::Finish
                };
                chunk_frame(&state.model, json!({ "content": content }), Value::Null)
            }
            Step::Finish => {
                pause(state.timing.word_delay).await;
                state.step = Step::Done;
                chunk_frame(&state.model, json!({}), json!("stop"))
            }
            Step::Done => {
                state.step = Step::End;
                done_frame()
            }
            Step::End => return None,
        };
        Some((Ok(Bytes::from(frame)), state))
    })
    .boxed()
}

fn chunk_frame(model: &str, delta: Value, finish_reason: Value) -> String {
    let payload = json!({
        "id": format!("mock-stream-{}", unix_now_millis()),
        "object": "chat.completion.chunk",
        "created": unix_now_secs(),
        "model": model,
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason,
        }],
    });
    data_frame(&payload.to_string())
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
