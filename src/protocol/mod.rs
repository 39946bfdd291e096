pub mod chunk;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sampling temperature sent with every chat request.
pub const CHAT_TEMPERATURE: f64 = 0.7;
/// Output token cap sent with every chat request.
pub const CHAT_MAX_TOKENS: u32 = 2048;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One turn of conversation history as sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<ChatMessage> for Value {
    fn from(message: ChatMessage) -> Self {
        serde_json::json!({ "role": message.role.as_str(), "content": message.content })
    }
}

/// Model entry returned by the models endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Fully-qualified upstream model id, e.g. `accounts/fireworks/models/...`.
    pub name: String,
    /// Display name.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Inbound body of the chat route once validated.
///
/// Message entries are forwarded upstream as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
}

/// Upstream chat-completion request wire type (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Value>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    /// Streaming request with the fixed playground sampling parameters.
    #[must_use]
    pub fn streaming(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            temperature: Some(CHAT_TEMPERATURE),
            max_tokens: Some(CHAT_MAX_TOKENS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert!(serde_json::from_str::<Role>("\"tool\"").is_err());
    }

    #[test]
    fn test_streaming_request_wire_shape() {
        let request = ChatCompletionRequest::streaming(
            "accounts/fireworks/models/qwen3-30b-a3b",
            vec![ChatMessage::user("Hello").into()],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "accounts/fireworks/models/qwen3-30b-a3b",
                "messages": [{ "role": "user", "content": "Hello" }],
                "stream": true,
                "temperature": 0.7,
                "max_tokens": 2048
            })
        );
    }

    #[test]
    fn test_model_descriptor_optional_description() {
        let model: ModelDescriptor =
            serde_json::from_value(json!({ "name": "m", "title": "M", "extra": 1 })).unwrap();
        assert!(model.description.is_none());
        assert_eq!(
            serde_json::to_value(&model).unwrap(),
            json!({ "name": "m", "title": "M" })
        );
    }
}
